// COCO-style persisted document
// http://cocodataset.org/#format-data
//
// Unlike plain COCO, `annotations` is an array of arrays aligned with `images`.
// Flat arrays written by other tools are accepted on read.

use serde::{Deserialize, Serialize};

use crate::classes::{LabelCatalog, PersistedCategory};
use crate::images::{ImageDimensions, ImageId};
use crate::state::{Annotation, AnnotationMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAnnotation {
    pub area: f64,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub category_id: u32,
    pub image_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationGroup {
    Grouped(Vec<PersistedAnnotation>),
    Single(PersistedAnnotation),
}

impl AnnotationGroup {
    pub fn iter(&self) -> impl Iterator<Item = &PersistedAnnotation> {
        match self {
            AnnotationGroup::Grouped(list) => list.iter(),
            AnnotationGroup::Single(ann) => std::slice::from_ref(ann).iter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    #[serde(default)]
    pub images: Vec<PersistedImage>,
    #[serde(default)]
    pub annotations: Vec<AnnotationGroup>,
    #[serde(default)]
    pub categories: Vec<PersistedCategory>,
}

impl PersistedDocument {
    /// Document served before anything has been saved.
    pub fn empty(catalog: &LabelCatalog) -> Self {
        PersistedDocument {
            images: Vec::new(),
            annotations: Vec::new(),
            categories: catalog.to_persisted(),
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.iter().map(|g| g.iter().count()).sum()
    }
}

/// One image going into `encode`, with its dimensions already fetched.
#[derive(Debug, Clone)]
pub struct ImageEntry<'a> {
    pub file_name: String,
    pub dimensions: ImageDimensions,
    pub annotations: &'a [Annotation],
}

/// Build the persisted document. Images get ids 1..=n in the order given.
pub fn encode(entries: &[ImageEntry<'_>], catalog: &LabelCatalog) -> PersistedDocument {
    let mut images = Vec::with_capacity(entries.len());
    let mut annotations = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let image_id = index as u32 + 1;
        images.push(PersistedImage {
            file_name: entry.file_name.clone(),
            width: entry.dimensions.width,
            height: entry.dimensions.height,
            id: image_id,
        });
        annotations.push(AnnotationGroup::Grouped(
            entry
                .annotations
                .iter()
                .map(|a| PersistedAnnotation {
                    area: a.area,
                    bbox: a.bbox,
                    category_id: a.category_id,
                    image_id,
                })
                .collect(),
        ));
    }

    PersistedDocument {
        images,
        annotations,
        categories: catalog.to_persisted(),
    }
}

/// Rebuild the per-image map from a persisted document.
///
/// Every listed image gets an entry, possibly empty. Annotations pointing at
/// no listed image or at an unknown category are skipped. Ordinals are not
/// restored.
pub fn decode(document: &PersistedDocument, catalog: &LabelCatalog) -> AnnotationMap {
    let mut map = AnnotationMap::new();

    for image in &document.images {
        let list = map.entry(ImageId::from_file_name(&image.file_name)).or_default();
        for ann in document.annotations.iter().flat_map(AnnotationGroup::iter) {
            if ann.image_id != image.id {
                continue;
            }
            if !catalog.contains(ann.category_id) {
                log::warn!(
                    "Skipping annotation on {} with unknown category {}",
                    image.file_name,
                    ann.category_id
                );
                continue;
            }
            list.push(Annotation {
                bbox: ann.bbox,
                area: ann.area,
                category_id: ann.category_id,
                ordinal: None,
            });
        }
    }

    let orphans = document
        .annotations
        .iter()
        .flat_map(AnnotationGroup::iter)
        .filter(|a| !document.images.iter().any(|img| img.id == a.image_id))
        .count();
    if orphans > 0 {
        log::warn!("Skipped {orphans} annotation(s) referencing no listed image");
    }

    map
}
