//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the largest size with the source's aspect ratio that fits
/// inside a bounding box.
///
/// One dimension matches the box exactly, the other is scaled
/// proportionally and rounded. Neither dimension drops below 1px. Sources
/// smaller than the box are scaled up.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Bounding box (width, height)
///
/// # Examples
/// ```
/// # use media_resizer::imaging::calculate_fit_dimensions;
/// // 2:1 landscape into a square box → width fills the box
/// assert_eq!(calculate_fit_dimensions((400, 200), (150, 150)), (150, 75));
///
/// // Portrait into a landscape box → height fills the box
/// assert_eq!(calculate_fit_dimensions((300, 600), (200, 100)), (50, 100));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 {
        return (max_w.max(1), max_h.max(1));
    }

    let scale_w = max_w as f64 / src_w as f64;
    let scale_h = max_h as f64 / src_h as f64;

    if scale_w <= scale_h {
        // Width is the constraining edge
        let h = (src_h as f64 * scale_w).round() as u32;
        (max_w.max(1), h.clamp(1, max_h.max(1)))
    } else {
        // Height is the constraining edge
        let w = (src_w as f64 * scale_h).round() as u32;
        (w.clamp(1, max_w.max(1)), max_h.max(1))
    }
}
