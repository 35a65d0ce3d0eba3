//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! catalog/product/shoe.jpg → /resized/150x150/shoe.jpg
//!     Size: 150x75 (box 150x150)
//!     URL: https://shop.example.com/media/resized/150x150/shoe.jpg
//! ```
//!
//! ## Warm
//!
//! ```text
//! 150x150 catalog/product/shoe.jpg → /resized/150x150/shoe.jpg
//! 150x150 catalog/product/broken.jpg: failed
//!     Processing failed: Failed to decode ...
//! Warm: 1 resized, 0 skipped, 1 failed (2 total)
//! ```

use crate::imaging::Dimensions;
use crate::resizer::public_url;
use crate::warm::{WarmEvent, WarmReport};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format the result of a single resize.
///
/// `actual` is the size of the written file when it could be read back.
pub fn format_resize_result(
    source: &str,
    requested: Dimensions,
    resized: Option<&str>,
    actual: Option<Dimensions>,
    base_url: Option<&str>,
) -> Vec<String> {
    let Some(path) = resized else {
        return vec![format!("{source}: no resized image ({requested})")];
    };

    let mut lines = vec![format!("{source} → {path}")];
    if let Some(dims) = actual {
        lines.push(format!("{}Size: {dims} (box {requested})", indent(1)));
    }
    if let Some(base) = base_url {
        lines.push(format!("{}URL: {}", indent(1), public_url(base, path)));
    }
    lines
}

pub fn print_resize_result(
    source: &str,
    requested: Dimensions,
    resized: Option<&str>,
    actual: Option<Dimensions>,
    base_url: Option<&str>,
) {
    for line in format_resize_result(source, requested, resized, actual, base_url) {
        println!("{line}");
    }
}

/// Format a single warm-up event.
pub fn format_warm_event(event: &WarmEvent) -> Vec<String> {
    match event {
        WarmEvent::Resized {
            source,
            size,
            output,
        } => vec![format!("{size} {source} → {output}")],
        WarmEvent::Skipped { source, size } => vec![format!("{size} {source}: skipped")],
        WarmEvent::Duplicate { source, size, kept } => {
            vec![format!("{size} {source}: skipped, same filename as {kept}")]
        }
        WarmEvent::Failed {
            source,
            size,
            error,
        } => vec![
            format!("{size} {source}: failed"),
            format!("{}{error}", indent(1)),
        ],
    }
}

/// Format the closing summary of a warm-up run.
pub fn format_warm_summary(report: &WarmReport) -> String {
    format!("Warm: {report}")
}
