use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

use crate::images::ImageId;

/// Axis-aligned rectangle in display-canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle spanned by two corner points, in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Rect {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn to_bbox(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Region reported when a drag finishes with a large enough rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
}

impl From<Rect> for SelectedRegion {
    fn from(rect: Rect) -> Self {
        SelectedRegion {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            area: rect.area(),
        }
    }
}

/// A labelled bounding box on one image.
///
/// `ordinal` is the per-category creation count used for labels like `Logo_2`.
/// It is never persisted, so annotations read back from disk have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// `[x, y, width, height]` in display pixels.
    pub bbox: [f64; 4],
    pub area: f64,
    pub category_id: u32,
    #[serde(rename = "index", default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
}

impl Annotation {
    pub fn new(rect: Rect, category_id: u32, ordinal: u32) -> Self {
        Annotation {
            bbox: rect.to_bbox(),
            area: rect.area(),
            category_id,
            ordinal: Some(ordinal),
        }
    }

    pub fn rect(&self) -> Rect {
        let [x, y, width, height] = self.bbox;
        Rect { x, y, width, height }
    }
}

/// Per-image annotation lists, keyed by the reversible image id.
///
/// Keeps insertion order: saved images are numbered in the order they were first annotated.
pub type AnnotationMap = IndexMap<ImageId, Vec<Annotation>>;
