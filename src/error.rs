//! Error taxonomy shared by every component of the annotator.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotatorError>;

#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// Bad input from the user: empty save, malformed body, unknown category.
    #[error("{0}")]
    Validation(String),

    #[error("invalid image id '{0}'")]
    InvalidImageId(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read image header of {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid annotation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AnnotatorError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AnnotatorError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AnnotatorError::Validation(message.into())
    }

    /// True for errors caused by what the user sent rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AnnotatorError::Validation(_) | AnnotatorError::InvalidImageId(_)
        )
    }

    /// Status code used by the service layer.
    pub fn status_code(&self) -> u16 {
        if self.is_user_error() { 400 } else { 500 }
    }
}
