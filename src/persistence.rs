//! Reading and writing the persisted annotation document.
//!
//! `save` needs the pixel size of every annotated image, so it reads image
//! headers on blocking tasks in parallel before anything is written. A failed
//! read aborts the save and leaves the previous file untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::classes::LabelCatalog;
use crate::config::AppConfig;
use crate::error::{AnnotatorError, Result};
use crate::export::{self, ExportResult, ImageEntry, PersistedDocument};
use crate::images::{ImageDimensions, ImageId, ImageLibrary};
use crate::state::{Annotation, AnnotationMap};

/// Reply of a successful save: `{ success, message, filePath }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
    pub file_path: String,
}

/// Body of a save request: annotation lists aligned by index with `imageIds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub annotations: Vec<Vec<Annotation>>,
    pub image_ids: Vec<ImageId>,
}

impl SaveRequest {
    /// Check alignment, categories and duplicate ids. Pairs keep request order.
    pub fn into_pairs(self, catalog: &LabelCatalog) -> Result<Vec<(ImageId, Vec<Annotation>)>> {
        if self.annotations.len() != self.image_ids.len() {
            return Err(AnnotatorError::validation(format!(
                "annotations ({}) and imageIds ({}) must have the same length",
                self.annotations.len(),
                self.image_ids.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(self.image_ids.len());
        for (image_id, list) in self.image_ids.into_iter().zip(self.annotations) {
            if !seen.insert(image_id.clone()) {
                return Err(AnnotatorError::validation(format!(
                    "image {image_id} is listed more than once"
                )));
            }
            if let Some(bad) = list.iter().find(|a| !catalog.contains(a.category_id)) {
                return Err(AnnotatorError::validation(format!(
                    "unknown category {} for image {image_id}",
                    bad.category_id
                )));
            }
            pairs.push((image_id, list));
        }
        Ok(pairs)
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationGateway {
    library: ImageLibrary,
    path: PathBuf,
    public_path: String,
    catalog: Arc<LabelCatalog>,
    fetch_timeout: Duration,
}

impl AnnotationGateway {
    pub fn new(
        library: ImageLibrary,
        path: impl Into<PathBuf>,
        public_path: impl Into<String>,
        catalog: Arc<LabelCatalog>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            library,
            path: path.into(),
            public_path: public_path.into(),
            catalog,
            fetch_timeout,
        }
    }

    pub fn from_config(config: &AppConfig, catalog: Arc<LabelCatalog>) -> Self {
        Self::new(
            ImageLibrary::new(config.storage.image_root()),
            config.storage.annotation_path(),
            config.storage.annotation_public_path(),
            catalog,
            Duration::from_secs(config.network.fetch_timeout_secs),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn library(&self) -> &ImageLibrary {
        &self.library
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// Write `map` as the persisted document.
    ///
    /// Fails with `Validation` when no image holds an annotation; nothing is
    /// written in that case. Images are numbered in map insertion order.
    pub async fn save(&self, map: &AnnotationMap) -> Result<SaveOutcome> {
        let items: Vec<(&ImageId, &[Annotation])> =
            map.iter().map(|(id, list)| (id, list.as_slice())).collect();
        self.save_entries(&items).await
    }

    /// Save from the wire body of a save request. Images are numbered in `imageIds` order.
    pub async fn save_request(&self, request: SaveRequest) -> Result<SaveOutcome> {
        let pairs = request.into_pairs(&self.catalog)?;
        let items: Vec<(&ImageId, &[Annotation])> =
            pairs.iter().map(|(id, list)| (id, list.as_slice())).collect();
        self.save_entries(&items).await
    }

    async fn save_entries(&self, items: &[(&ImageId, &[Annotation])]) -> Result<SaveOutcome> {
        if items.iter().all(|(_, list)| list.is_empty()) {
            return Err(AnnotatorError::validation("No annotations to save"));
        }

        let file_names = items
            .iter()
            .map(|(id, _)| id.file_name())
            .collect::<Result<Vec<_>>>()?;
        let dimensions = self.fetch_dimensions(&file_names).await?;

        let entries: Vec<ImageEntry<'_>> = file_names
            .into_iter()
            .zip(dimensions)
            .zip(items)
            .map(|((file_name, dimensions), &(_, annotations))| ImageEntry {
                file_name,
                dimensions,
                annotations,
            })
            .collect();
        let document = export::encode(&entries, &self.catalog);
        let stats = ExportResult::of(&document);

        self.write_document(&document).await?;
        log::info!(
            "Saved {} annotation(s) for {} image(s) to {}",
            stats.annotations_exported,
            stats.images_exported,
            self.path.display()
        );

        Ok(SaveOutcome {
            success: true,
            message: "Annotations saved successfully".to_string(),
            file_path: self.public_path.clone(),
        })
    }

    /// Stored document, or the empty default when nothing was saved yet.
    pub async fn read_document(&self) -> Result<PersistedDocument> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedDocument::empty(&self.catalog));
            }
            Err(e) => {
                return Err(AnnotatorError::io(
                    format!("Failed to read {}", self.path.display()),
                    e,
                ));
            }
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the stored annotations. Any failure yields an empty map.
    pub async fn load(&self) -> AnnotationMap {
        match self.read_document().await {
            Ok(document) => {
                let map = export::decode(&document, &self.catalog);
                log::info!("Loaded annotations for {} image(s)", map.len());
                map
            }
            Err(e) => {
                log::error!("Failed to load annotations, starting empty: {e}");
                AnnotationMap::new()
            }
        }
    }

    /// Header reads for every file, in input order. The first failure cancels the rest.
    async fn fetch_dimensions(&self, file_names: &[String]) -> Result<Vec<ImageDimensions>> {
        let mut tasks = JoinSet::new();
        for (index, name) in file_names.iter().cloned().enumerate() {
            let library = self.library.clone();
            let limit = self.fetch_timeout;
            tasks.spawn(async move {
                let read = tokio::task::spawn_blocking(move || library.dimensions(&name));
                let result = match tokio::time::timeout(limit, read).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join)) => Err(AnnotatorError::Task(join.to_string())),
                    Err(_) => Err(AnnotatorError::Timeout(limit)),
                };
                (index, result)
            });
        }

        let mut dimensions = vec![None; file_names.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| AnnotatorError::Task(e.to_string()))?;
            match result {
                Ok(dims) => dimensions[index] = Some(dims),
                Err(e) => {
                    tasks.abort_all();
                    log::error!("Dimension read for {} failed: {e}", file_names[index]);
                    return Err(e);
                }
            }
        }

        dimensions
            .into_iter()
            .map(|d| d.ok_or_else(|| AnnotatorError::Task("missing dimension result".into())))
            .collect()
    }

    /// Write to a sibling temp file and rename it over the target.
    async fn write_document(&self, document: &PersistedDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AnnotatorError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| AnnotatorError::io(format!("Failed to write {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AnnotatorError::io(format!("Failed to replace {}", self.path.display()), e)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Rect;

    fn ann(category_id: u32) -> Annotation {
        Annotation::new(Rect { x: 1.0, y: 2.0, width: 30.0, height: 40.0 }, category_id, 1)
    }

    #[test]
    fn test_request_length_mismatch() {
        let request = SaveRequest {
            annotations: vec![vec![ann(1)], vec![]],
            image_ids: vec![ImageId::from_file_name("a.png")],
        };
        let err = request.into_pairs(&LabelCatalog::default()).unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_request_duplicate_image_id() {
        let request = SaveRequest {
            annotations: vec![vec![ann(1)], vec![ann(2)]],
            image_ids: vec![ImageId::from_file_name("a.png"), ImageId::from_file_name("a.png")],
        };
        let err = request.into_pairs(&LabelCatalog::default()).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_request_keeps_order() {
        let request = SaveRequest {
            annotations: vec![vec![ann(2)], vec![ann(1)]],
            image_ids: vec![ImageId::from_file_name("b.png"), ImageId::from_file_name("a.png")],
        };
        let pairs = request.into_pairs(&LabelCatalog::default()).unwrap();
        assert_eq!(pairs[0].0, ImageId::from_file_name("b.png"));
        assert_eq!(pairs[1].1[0].category_id, 1);
    }

    #[test]
    fn test_request_unknown_category() {
        let request = SaveRequest {
            annotations: vec![vec![ann(1), ann(9)]],
            image_ids: vec![ImageId::from_file_name("a.png")],
        };
        let err = request.into_pairs(&LabelCatalog::default()).unwrap_err();
        assert!(err.to_string().contains("unknown category 9"));
    }

    #[test]
    fn test_request_wire_shape() {
        let request: SaveRequest = serde_json::from_str(
            r#"{
                "annotations": [[{"bbox": [1, 2, 3, 4], "area": 12, "category_id": 2, "index": 1}]],
                "imageIds": ["YS5wbmc="]
            }"#,
        )
        .unwrap();
        let pairs = request.into_pairs(&LabelCatalog::default()).unwrap();
        let (image_id, list) = &pairs[0];
        assert_eq!(image_id, &ImageId::from_file_name("a.png"));
        assert_eq!(list[0].ordinal, Some(1));
        assert_eq!(list[0].bbox, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_outcome_uses_camel_case() {
        let outcome = SaveOutcome {
            success: true,
            message: "ok".into(),
            file_path: "/annotations/annotation_data.json".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["filePath"], "/annotations/annotation_data.json");
    }
}
