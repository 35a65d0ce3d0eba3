//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The
//! [`resizer`](crate::resizer) decides where an image goes and at what size;
//! the [`backend`](super::backend) does the pixel work. Keeping the two apart
//! lets tests swap in a mock backend without touching path logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`ResizeParams`]: full specification for a resize: source, output path,
//!   bounding box, aspect-ratio flag, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
///
/// Only constructible through [`Quality::new`], which clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a single resize: open `source`, scale, save to `output`.
///
/// With `keep_aspect_ratio` set, `width` and `height` are a bounding box and
/// the output fits inside it. Without it the output is exactly
/// `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub keep_aspect_ratio: bool,
    pub quality: Quality,
}
