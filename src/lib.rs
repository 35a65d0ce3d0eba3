//! # Media Resizer
//!
//! Resizes images from a media directory and caches each variant under a
//! path derived from the requested size, so the same request always lands
//! on the same file.
//!
//! ```text
//! media/catalog/product/shoe.jpg
//!     resize("catalog/product/shoe.jpg", 150, 150)
//!         → media/resized/150x150/shoe.jpg
//!         ← "/resized/150x150/shoe.jpg"
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resizer`] | The resize-and-cache pipeline and its failure taxonomy |
//! | [`media`] | Read/write directory views over the media root, with traversal guarding |
//! | [`imaging`] | Image backend trait, bounding-box math, `image`-crate backend |
//! | [`config`] | `resizer.toml` loading, merging, and validation |
//! | [`warm`] | Walks the media root and pre-generates variants in parallel |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Absent On Failure
//!
//! [`ImageResizer::resize`](resizer::ImageResizer::resize) returns
//! `Ok(None)` for every filesystem-level failure: missing source, cache
//! directory that cannot be created, output that never appeared. Callers that
//! need the reason use [`try_resize`](resizer::ImageResizer::try_resize).
//! Decode and encode errors are different: they surface as `Err`, because a
//! corrupt upload is something the caller should hear about.
//!
//! ## Re-check, Don't Trust
//!
//! Every step confirms its result on disk before moving on, instead of relying
//! on the previous call's return value. This is also what makes concurrent
//! calls for the same size safe without locking: whoever loses the race to
//! create the cache directory finds it already there.
//!
//! ## No Staleness Tracking
//!
//! The cache is addressed purely by path. Nothing records when a variant was
//! made, and the resizer never checks whether the variant already exists, so
//! every call re-encodes. Serving an existing variant without calling the
//! resizer is the caller's job.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling). No
//! ImageMagick, no GD, no system libraries.

pub mod config;
pub mod imaging;
pub mod media;
pub mod output;
pub mod resizer;
pub mod warm;

pub use resizer::{
    DEFAULT_HEIGHT, DEFAULT_SUBDIRECTORY, DEFAULT_WIDTH, ImageResizer, MediaResizer, ResizeError,
};

#[cfg(test)]
pub(crate) mod test_helpers;
