use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnnotatorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory of source images, relative to `data_dir`.
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    /// Persisted document, relative to `data_dir`.
    #[serde(default = "default_annotation_file")]
    pub annotation_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_min_selection")]
    pub min_selection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_data_dir() -> String {
    "./public".to_string()
}

fn default_image_dir() -> String {
    "no_annotated_ads_images".to_string()
}

fn default_annotation_file() -> String {
    "annotations/annotation_data.json".to_string()
}

fn default_max_width() -> u32 {
    800
}

fn default_max_height() -> u32 {
    400
}

fn default_min_selection() -> f64 {
    5.0
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            image_dir: default_image_dir(),
            annotation_file: default_annotation_file(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            min_selection: default_min_selection(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            display: DisplayConfig::default(),
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StorageConfig {
    /// `data_dir` with `~` and environment variables expanded.
    pub fn data_root(&self) -> PathBuf {
        let expanded = shellexpand::full(&self.data_dir)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| self.data_dir.clone());
        PathBuf::from(expanded)
    }

    pub fn image_root(&self) -> PathBuf {
        self.data_root().join(&self.image_dir)
    }

    pub fn annotation_path(&self) -> PathBuf {
        self.data_root().join(&self.annotation_file)
    }

    /// Web-style path reported back after a save, e.g. `/annotations/annotation_data.json`.
    pub fn annotation_public_path(&self) -> String {
        let relative = self.annotation_file.replace('\\', "/");
        format!("/{}", relative.trim_start_matches("./").trim_start_matches('/'))
    }
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ad-annotator")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from the platform config dir, or defaults when absent or broken.
pub fn load_config() -> AppConfig {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            log::warn!("No config directory available; using defaults.");
            AppConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Failed to parse config file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Using defaults.", path.display(), e);
            AppConfig::default()
        }
    }
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AnnotatorError::io("Failed to create config directory", e))?;
    }

    let toml = toml::to_string_pretty(config)
        .map_err(|e| AnnotatorError::Config(format!("Failed to serialize config: {e}")))?;

    std::fs::write(path, toml).map_err(|e| AnnotatorError::io("Failed to write config file", e))?;

    Ok(())
}
