use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnnotatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Body of the metadata endpoint: `{ width, height, format, size }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size: u64,
}

/// Read pixel dimensions from the header of a PNG or JPEG file.
///
/// Only the header is decoded. Anything that is not a PNG or JPEG, or whose
/// header does not carry usable dimensions, is a `Format` error.
pub fn read_dimensions(path: &Path) -> Result<ImageDimensions> {
    let (dimensions, _) = probe(path)?;
    Ok(dimensions)
}

pub fn read_metadata(path: &Path) -> Result<ImageMetadata> {
    let (dimensions, format) = probe(path)?;
    let size = std::fs::metadata(path)
        .map_err(|e| AnnotatorError::io(format!("Failed to stat {}", path.display()), e))?
        .len();
    Ok(ImageMetadata {
        width: dimensions.width,
        height: dimensions.height,
        format: format_name(format).to_string(),
        size,
    })
}

fn probe(path: &Path) -> Result<(ImageDimensions, ImageFormat)> {
    let reader = ImageReader::open(path)
        .map_err(|e| AnnotatorError::io(format!("Failed to open {}", path.display()), e))?
        .with_guessed_format()
        .map_err(|e| AnnotatorError::io(format!("Failed to read {}", path.display()), e))?;

    let format = match reader.format() {
        Some(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => format,
        Some(other) => {
            return Err(AnnotatorError::Format {
                path: path.to_path_buf(),
                reason: format!("unsupported format {other:?}"),
            });
        }
        None => {
            return Err(AnnotatorError::Format {
                path: path.to_path_buf(),
                reason: "unrecognised file signature".to_string(),
            });
        }
    };

    let (width, height) = reader.into_dimensions().map_err(|e| AnnotatorError::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if width == 0 || height == 0 {
        return Err(AnnotatorError::Format {
            path: path.to_path_buf(),
            reason: format!("header reports empty dimensions {width}x{height}"),
        });
    }

    Ok((ImageDimensions { width, height }, format))
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        _ => "unknown",
    }
}
