//! Shared test utilities for the media-resizer test suite.
//!
//! Provides a throwaway media root and synthetic image writers so tests
//! never depend on checked-in fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, media) = setup_media();
//! create_test_jpeg(&tmp.path().join("shoe.jpg"), 400, 200);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::{MAIN_SEPARATOR, Path};
use tempfile::TempDir;

use crate::media::MediaDirectory;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create an empty media root and open it.
///
/// The `TempDir` must outlive the `MediaDirectory`.
pub fn setup_media() -> (TempDir, MediaDirectory) {
    let tmp = TempDir::new().unwrap();
    let media = MediaDirectory::open(tmp.path()).unwrap();
    (tmp, media)
}

/// Join path parts with the platform separator, the way the resizer
/// reports relative paths.
pub fn sep(parts: &[&str]) -> String {
    parts.join(&MAIN_SEPARATOR.to_string())
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a small valid JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid RGBA PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}
