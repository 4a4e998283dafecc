//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Scale factors are kept as exact integer ratios; nothing goes through
//! floating point.

/// Divide `numerator / denominator`, rounding to the nearest integer with
/// ties going to the even neighbour.
///
/// ```
/// # use image_steps::imaging::round_half_even;
/// assert_eq!(round_half_even(5, 2), 2);  // 2.5 → 2
/// assert_eq!(round_half_even(7, 2), 4);  // 3.5 → 4
/// assert_eq!(round_half_even(5, 3), 2);  // 1.67 → 2
/// ```
pub fn round_half_even(numerator: u64, denominator: u64) -> u64 {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    let twice_remainder = 2 * (numerator % denominator);
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

/// Calculate the largest aspect-preserving size that fits inside `bounds`.
///
/// The scale factor is `min(max_w / w, max_h / h)`, compared by
/// cross-multiplication. The constrained side equals its bound exactly; the
/// other side is rounded half-to-even and never drops below one pixel.
///
/// # Arguments
/// * `original` - Source dimensions (width, height), both non-zero
/// * `bounds` - Bounding box (width, height), both non-zero
///
/// # Examples
/// ```
/// # use image_steps::imaging::calculate_fit_dimensions;
/// assert_eq!(calculate_fit_dimensions((800, 600), (400, 400)), (400, 300));
/// assert_eq!(calculate_fit_dimensions((600, 800), (400, 400)), (300, 400));
/// ```
pub fn calculate_fit_dimensions(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = (u64::from(original.0), u64::from(original.1));
    let (max_w, max_h) = (u64::from(bounds.0), u64::from(bounds.1));

    if max_w * h <= max_h * w {
        // Width is the limiting side: s = max_w / w
        let scaled_h = round_half_even(h * max_w, w).max(1);
        (bounds.0, scaled_h as u32)
    } else {
        // Height is the limiting side: s = max_h / h
        let scaled_w = round_half_even(w * max_h, h).max(1);
        (scaled_w as u32, bounds.1)
    }
}

/// Like [`calculate_fit_dimensions`], but never enlarges.
///
/// Returns `original` unchanged when it already fits inside `bounds`.
pub fn calculate_downscale_dimensions(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    if original.0 <= bounds.0 && original.1 <= bounds.1 {
        original
    } else {
        calculate_fit_dimensions(original, bounds)
    }
}
