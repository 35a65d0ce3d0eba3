//! Resizer configuration module.
//!
//! Handles loading, validating, and merging `resizer.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! media_root = "pub/media"      # Directory that source paths are relative to
//! subdirectory = "resized"      # Cache directory under the media root
//! # base_url = "https://shop.example.com/media"
//!
//! [images]
//! width = 150                   # Default bounding-box width
//! height = 150                  # Default bounding-box height
//! quality = 80                  # JPEG encoding quality (1-100)
//!
//! [processing]
//! max_processes = 4             # Max parallel workers for `warm` (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Dimensions, Quality};
use crate::media::is_separator;
use crate::resizer::{DEFAULT_HEIGHT, DEFAULT_SUBDIRECTORY, DEFAULT_WIDTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "resizer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resizer configuration loaded from `resizer.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Directory that source paths are resolved against.
    pub media_root: PathBuf,
    /// Name of the cache directory under the media root.
    pub subdirectory: String,
    /// Public URL prefix for the media root, used to print full URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default dimensions and encoding quality.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ResizerConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("pub/media"),
            subdirectory: DEFAULT_SUBDIRECTORY.to_string(),
            base_url: None,
            images: ImagesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trimmed = self.subdirectory.trim_matches(is_separator);
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "subdirectory must not be empty".into(),
            ));
        }
        if trimmed.split(is_separator).any(|part| part == "..") {
            return Err(ConfigError::Validation(
                "subdirectory must stay inside the media root".into(),
            ));
        }
        if self.images.width == 0 || self.images.height == 0 {
            return Err(ConfigError::Validation(
                "images.width and images.height must be non-zero".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

/// Default dimensions and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Bounding-box width used when a caller gives none.
    pub width: u32,
    /// Bounding-box height used when a caller gives none.
    pub height: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl ImagesConfig {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            quality: Quality::default().value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from a file, merging it on top of stock defaults.
///
/// A missing file yields the defaults. Unknown keys and invalid values are
/// errors.
pub fn load_config(path: &Path) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `resizer.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Media Resizer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory that image paths are resolved against.
media_root = "pub/media"

# Cache directory, created under media_root. Resized variants land in
# <subdirectory>/<width>x<height>/<original filename>.
subdirectory = "resized"

# Public URL of media_root. When set, resize prints the full URL too.
# base_url = "https://shop.example.com/media"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Default bounding box. Aspect ratio is always preserved, so one side of
# the output matches the box and the other is smaller or equal.
width = 150
height = 150

# JPEG encoding quality (1 = worst, 100 = best). Other formats ignore it.
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `warm`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
