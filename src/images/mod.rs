//! Image directory scanning and reversible image identifiers.
//!
//! - `ImageId` - base64 form of the file name, decodable back without a side table
//! - `ImageLibrary` - the read-only directory of source images
//! - `metadata` - pixel dimensions read from the image header

mod metadata;

pub use metadata::*;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnnotatorError, Result};

/// Extensions accepted by the lister, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Opaque, reversible identifier of an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn from_file_name(file_name: &str) -> Self {
        ImageId(STANDARD.encode(file_name.as_bytes()))
    }

    /// Wrap an identifier received from a client. Validity is checked by `file_name`.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        ImageId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the original file name.
    pub fn file_name(&self) -> Result<String> {
        let bytes = STANDARD
            .decode(self.0.as_bytes())
            .map_err(|_| AnnotatorError::InvalidImageId(self.0.clone()))?;
        String::from_utf8(bytes).map_err(|_| AnnotatorError::InvalidImageId(self.0.clone()))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: ImageId,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Directory of source images. Never written to.
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    root: PathBuf,
}

impl ImageLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the directory for png/jpg/jpeg files, newest first.
    pub fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            AnnotatorError::io(format!("Failed to read image folder {}", self.root.display()), e)
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AnnotatorError::io("Failed to read folder entry", e))?;
            let path = entry.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("Skipping non UTF-8 file name {}", path.display());
                continue;
            };
            let meta = entry
                .metadata()
                .map_err(|e| AnnotatorError::io(format!("Failed to stat {}", path.display()), e))?;
            let modified = meta
                .modified()
                .map_err(|e| AnnotatorError::io(format!("Failed to stat {}", path.display()), e))?;

            records.push(ImageRecord {
                id: ImageId::from_file_name(name),
                name: name.to_string(),
                path: path.clone(),
                size: meta.len(),
                last_modified: DateTime::<Utc>::from(modified),
            });
        }

        records.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        log::info!("Found {} image(s) in {}", records.len(), self.root.display());
        Ok(records)
    }

    /// Map a bare file name to its path, rejecting anything that could escape the directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AnnotatorError::validation("image name is required"));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(AnnotatorError::validation(format!(
                "image name '{name}' must be a bare file name"
            )));
        }
        Ok(self.root.join(name))
    }

    pub fn metadata(&self, name: &str) -> Result<ImageMetadata> {
        read_metadata(&self.resolve(name)?)
    }

    pub fn dimensions(&self, name: &str) -> Result<ImageDimensions> {
        read_dimensions(&self.resolve(name)?)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
