// Persisted annotation document

pub mod coco;

pub use coco::{
    AnnotationGroup, ImageEntry, PersistedAnnotation, PersistedDocument, PersistedImage, decode,
    encode,
};

/// Statistics of a write, logged and echoed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportResult {
    pub images_exported: usize,
    pub annotations_exported: usize,
}

impl ExportResult {
    pub fn of(document: &PersistedDocument) -> Self {
        ExportResult {
            images_exported: document.images.len(),
            annotations_exported: document.annotation_count(),
        }
    }
}
