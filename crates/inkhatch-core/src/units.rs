//! Unit conversion utilities
//!
//! Handles conversion between canvas pixels and physical millimeters.
//! The drawing surface uses a fixed resolution of [`PX_PER_MM`].

/// Canvas resolution in pixels per millimeter (96 DPI).
pub const PX_PER_MM: f64 = 3.78;

/// Convert millimeters to canvas pixels
pub fn mm_to_px(mm: f64) -> f64 {
    mm * PX_PER_MM
}

/// Convert canvas pixels to millimeters
pub fn px_to_mm(px: f64) -> f64 {
    px / PX_PER_MM
}

/// Number of whole canvas pixels covering `mm` millimeters (at least one).
pub fn mm_to_px_count(mm: f64) -> u32 {
    let px = mm_to_px(mm).round();
    if px.is_finite() && px >= 1.0 {
        px as u32
    } else {
        1
    }
}

/// Format a coordinate with fixed 3-decimal precision.
///
/// Non-finite values are written as zero so they never reach a machine.
pub fn format_coord(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let text = format!("{:.3}", value);
    // Avoid "-0.000"
    if text == "-0.000" {
        "0.000".to_string()
    } else {
        text
    }
}
