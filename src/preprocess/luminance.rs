//! Per-pixel intensity transforms.

/// Mid-level the contrast stretch pivots around.
pub const MID_LEVEL: f32 = 128.0;

/// Rec. 709 luminosity weights.
const RED_WEIGHT: f32 = 0.2126;
const GREEN_WEIGHT: f32 = 0.7152;
const BLUE_WEIGHT: f32 = 0.0722;

/// Converts one RGB pixel to a luminosity-weighted gray level.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    RED_WEIGHT * f32::from(r) + GREEN_WEIGHT * f32::from(g) + BLUE_WEIGHT * f32::from(b)
}

/// Linear contrast stretch around mid-gray, clamped to `[0, 255]`.
///
/// `v' = clamp(factor * (v - 128) + 128, 0, 255)`, rounded to the
/// nearest level.
#[inline]
pub fn stretch_contrast(value: f32, factor: f32) -> u8 {
    let stretched = factor * (value - MID_LEVEL) + MID_LEVEL;
    stretched.clamp(0.0, 255.0).round() as u8
}

/// Grayscale + contrast in one step.
#[inline]
pub fn normalize_pixel(r: u8, g: u8, b: u8, factor: f32) -> u8 {
    stretch_contrast(luminance(r, g, b), factor)
}
