//! Handlers for the four service routes.
//!
//! Each handler returns the status code and JSON body to send; routing and the
//! HTTP server itself belong to whatever hosts the annotator.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{AnnotatorError, Result};
use crate::persistence::{AnnotationGateway, SaveRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => ApiReply { status: 200, body },
            Err(e) => Self::error(&AnnotatorError::from(e)),
        }
    }

    fn error(err: &AnnotatorError) -> Self {
        if err.is_user_error() {
            log::warn!("Rejected request: {err}");
        } else {
            log::error!("Request failed: {err}");
        }
        ApiReply {
            status: err.status_code(),
            body: json!({ "error": err.to_string() }),
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result {
            Ok(body) => Self::ok(&body),
            Err(e) => Self::error(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `GET /api/images` -> `{ images: [...] }`
pub async fn get_images(gateway: &AnnotationGateway) -> ApiReply {
    let library = gateway.library().clone();
    let result = tokio::task::spawn_blocking(move || library.list_images())
        .await
        .map_err(|e| AnnotatorError::Task(e.to_string()))
        .and_then(|listed| listed)
        .map(|images| json!({ "images": images }));
    ApiReply::from_result(result)
}

/// `GET /api/images/metadata?image=<name>` -> `{ width, height, format, size }`
pub async fn get_image_metadata(gateway: &AnnotationGateway, image: Option<&str>) -> ApiReply {
    let Some(name) = image.filter(|n| !n.trim().is_empty()) else {
        return ApiReply::error(&AnnotatorError::validation("Image name is required"));
    };
    let library = gateway.library().clone();
    let name = name.to_string();
    let result = tokio::task::spawn_blocking(move || library.metadata(&name))
        .await
        .map_err(|e| AnnotatorError::Task(e.to_string()))
        .and_then(|read| read);
    ApiReply::from_result(result)
}

/// `GET /api/annotations` -> the stored document or the empty default.
pub async fn get_annotations(gateway: &AnnotationGateway) -> ApiReply {
    ApiReply::from_result(gateway.read_document().await)
}

/// `POST /api/annotations` with `{ annotations, imageIds }`.
pub async fn post_annotations(gateway: &AnnotationGateway, body: &str) -> ApiReply {
    let request: SaveRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            let err = AnnotatorError::validation(format!("Malformed request body: {e}"));
            return ApiReply::error(&err);
        }
    };
    ApiReply::from_result(gateway.save_request(request).await)
}
