//! Resize-and-cache orchestration.
//!
//! [`ImageResizer::resize`] takes an image path relative to the media root
//! and a bounding box, writes a scaled copy to
//! `<subdirectory>/<width>x<height>/<filename>` and returns that path with
//! a single leading separator, ready to append to a media URL.
//!
//! ```text
//! media/
//! ├── catalog/product/shoe.jpg          ← resize("catalog/product/shoe.jpg", 150, 150)
//! └── resized/
//!     └── 150x150/
//!         └── shoe.jpg                  → "/resized/150x150/shoe.jpg"
//! ```
//!
//! # Pipeline
//!
//! 1. Resolve the source; it must be a regular file.
//! 2. Derive the cache directory from subdirectory and dimensions.
//! 3. Create it if missing. A failed create is only logged.
//! 4. Re-check that the directory exists.
//! 5. Hand the source to the [`ImageBackend`] with aspect ratio kept.
//! 6. Check the output file exists.
//! 7. Return the root-relative output path.
//!
//! Each step checks the filesystem instead of trusting the previous call.
//! The artifact itself is never checked up front, so repeated calls always
//! re-encode and overwrite.
//!
//! # Failure reporting
//!
//! [`try_resize`](ImageResizer::try_resize) reports which guard failed via
//! [`ResizeError`]. [`resize`](ImageResizer::resize) folds every guard
//! failure into `Ok(None)`, so callers cannot tell a missing image from an
//! unwritable cache. Backend faults (corrupt or unsupported images) are not
//! folded: they come back as `Err(BackendError)`.
//!
//! Names colliding across source directories share a cache slot:
//! `a/logo.png` and `b/logo.png` both land in `resized/150x150/logo.png`,
//! and the last call wins. [`warm`](crate::warm) settles this up front by
//! resizing only the first source with a given name.

use crate::config::ResizerConfig;
use crate::imaging::{BackendError, Dimensions, ImageBackend, Quality, ResizeParams, RustBackend};
use crate::media::{MediaDirectory, MediaError, ReadDirectory, WriteDirectory, is_separator};
use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default bounding-box width.
pub const DEFAULT_WIDTH: u32 = 150;

/// Default bounding-box height.
pub const DEFAULT_HEIGHT: u32 = 150;

/// Default cache directory name under the media root.
pub const DEFAULT_SUBDIRECTORY: &str = "resized";

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Source image not found: {0}")]
    SourceNotFound(String),
    #[error("Invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Cache directory unavailable: {0}")]
    CacheDirectoryUnavailable(String),
    #[error("Resized image was not written: {0}")]
    SaveFailed(PathBuf),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Resizes images from a media root into a per-size cache directory.
///
/// Generic over its collaborators so tests can drive it with a mock
/// backend. Production code uses [`MediaResizer`].
pub struct ImageResizer<R, W, B> {
    reader: R,
    writer: W,
    backend: B,
    subdirectory: String,
    defaults: Dimensions,
    quality: Quality,
}

/// Resizer over the local filesystem and the `image` crate.
pub type MediaResizer = ImageResizer<MediaDirectory, MediaDirectory, RustBackend>;

impl MediaResizer {
    /// Build a filesystem resizer from a loaded config.
    pub fn from_config(config: &ResizerConfig) -> Result<Self, MediaError> {
        let media = MediaDirectory::open(&config.media_root)?;
        Ok(ImageResizer::new(media.clone(), media, RustBackend::new())
            .with_subdirectory(&config.subdirectory)
            .with_defaults(config.images.dimensions())
            .with_quality(config.images.quality()))
    }
}

impl<R: ReadDirectory, W: WriteDirectory, B: ImageBackend> ImageResizer<R, W, B> {
    pub fn new(reader: R, writer: W, backend: B) -> Self {
        Self {
            reader,
            writer,
            backend,
            subdirectory: DEFAULT_SUBDIRECTORY.to_string(),
            defaults: Dimensions::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            quality: Quality::default(),
        }
    }

    /// Use a different cache directory name. Surrounding separators are
    /// stripped and `/` becomes the platform separator, so nested names like
    /// `cache/thumbs` come back with uniform separators.
    ///
    /// An empty name puts the `<w>x<h>` directories straight under the
    /// media root.
    pub fn with_subdirectory(mut self, subdirectory: &str) -> Self {
        self.subdirectory = subdirectory
            .trim_matches(is_separator)
            .replace('/', MAIN_SEPARATOR_STR);
        self
    }

    pub fn with_defaults(mut self, defaults: Dimensions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn subdirectory(&self) -> &str {
        &self.subdirectory
    }

    pub fn defaults(&self) -> Dimensions {
        self.defaults
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Root-relative cache directory for a size, e.g. `resized/150x150`.
    ///
    /// Depends only on the subdirectory and the dimensions.
    pub fn cache_key(&self, width: u32, height: u32) -> String {
        if self.subdirectory.is_empty() {
            format!("{width}x{height}")
        } else {
            format!("{}{MAIN_SEPARATOR}{width}x{height}", self.subdirectory)
        }
    }

    /// Absolute cache directory for a size.
    pub fn cache_directory(&self, width: u32, height: u32) -> Result<PathBuf, MediaError> {
        self.reader.absolute_path(&self.cache_key(width, height))
    }

    /// Resize with the configured default dimensions.
    pub fn resize_default(&self, path: &str) -> Result<Option<String>, BackendError> {
        self.resize(path, self.defaults.width, self.defaults.height)
    }

    /// Resize `path` into a `width` x `height` box and return the cached
    /// path, or `None` if any filesystem guard failed.
    pub fn resize(
        &self,
        path: &str,
        width: u32,
        height: u32,
    ) -> Result<Option<String>, BackendError> {
        match self.try_resize(path, width, height) {
            Ok(resized) => Ok(Some(resized)),
            Err(ResizeError::Imaging(e)) => Err(e),
            Err(e) => {
                debug!(path, width, height, error = %e, "resize produced no image");
                Ok(None)
            }
        }
    }

    /// Resize `path` into a `width` x `height` box, reporting which step
    /// failed.
    pub fn try_resize(&self, path: &str, width: u32, height: u32) -> Result<String, ResizeError> {
        if width == 0 || height == 0 {
            return Err(ResizeError::InvalidDimensions { width, height });
        }

        let source = match self.reader.absolute_path(path) {
            Ok(abs) if self.reader.is_file(&abs) => abs,
            _ => return Err(ResizeError::SourceNotFound(path.to_string())),
        };
        let file_name = source
            .file_name()
            .ok_or_else(|| ResizeError::SourceNotFound(path.to_string()))?;

        let cache_dir = self
            .cache_directory(width, height)
            .map_err(|_| ResizeError::CacheDirectoryUnavailable(self.cache_key(width, height)))?;
        let relative_dir = self.reader.relative_path(&cache_dir);

        if !self.reader.is_directory(Path::new(&relative_dir)) {
            debug!(directory = %relative_dir, "creating cache directory");
            if let Err(e) = self.writer.create(&cache_dir) {
                debug!(directory = %relative_dir, error = %e, "cache directory create failed");
            }
        }
        if !self.reader.is_directory(Path::new(&relative_dir)) {
            return Err(ResizeError::CacheDirectoryUnavailable(relative_dir));
        }

        let output = cache_dir.join(file_name);
        self.backend.resize(&ResizeParams {
            source,
            output: output.clone(),
            width,
            height,
            keep_aspect_ratio: true,
            quality: self.quality,
        })?;

        let relative_file = self.reader.relative_path(&output);
        if !self.reader.is_file(Path::new(&relative_file)) {
            return Err(ResizeError::SaveFailed(output));
        }

        debug!(path, resized = %relative_file, "resized image");
        Ok(with_leading_separator(&relative_file))
    }
}

/// Prefix a path with exactly one separator, collapsing any run of leading
/// separators.
pub fn with_leading_separator(path: &str) -> String {
    format!("{MAIN_SEPARATOR}{}", path.trim_start_matches(is_separator))
}

/// Join a public base URL and a resized path with exactly one `/`.
pub fn public_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches(is_separator)
            .replace(MAIN_SEPARATOR, "/")
    )
}
