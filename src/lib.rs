//! Bounding-box annotator for advertisement images.
//!
//! Lists images from a directory, lets the user draw labelled rectangles on a
//! scaled-down view of each one, and persists the result as a COCO-style JSON
//! document.

pub mod api;
pub mod classes;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod images;
pub mod persistence;
pub mod state;
pub mod surface;
pub mod utils;

pub use classes::LabelCatalog;
pub use config::AppConfig;
pub use display::compute_display_size;
pub use error::{AnnotatorError, Result};
pub use images::{ImageDimensions, ImageId, ImageLibrary, ImageRecord};
pub use persistence::{AnnotationGateway, SaveOutcome, SaveRequest};
pub use state::{Annotation, AnnotationMap, AnnotationStore, Session};
pub use surface::DrawingSurface;
