//! Frame normalization ahead of text extraction.
//!
//! Each captured still is converted to luminosity grayscale, given a
//! gentle linear contrast stretch around mid-gray, and encoded as JPEG.
//! The stretch keeps gradients intact rather than binarizing, which reads
//! better at varying card distances.

mod encode;
mod luminance;

pub use encode::{encode_jpeg, EncodeError, EncodedImage};
pub use luminance::{luminance, normalize_pixel, stretch_contrast, MID_LEVEL};

use crate::capture::{Frame, CHANNELS};

/// Default contrast factor.
pub const DEFAULT_CONTRAST: f32 = 1.3;

/// A grayscale, contrast-stretched frame.
///
/// Stored as one level per pixel; [`NormalizedFrame::to_rgba`] expands it
/// back to an image with the level copied into all three color channels.
#[derive(Clone)]
pub struct NormalizedFrame {
    levels: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl NormalizedFrame {
    /// Wraps precomputed gray levels.
    pub fn from_levels(levels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            levels,
            width,
            height,
            sequence,
        }
    }

    /// One gray level per pixel, row-major.
    #[inline]
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Expands to RGBA with an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.levels.len() * CHANNELS);
        for &level in &self.levels {
            out.extend_from_slice(&[level, level, level, 0xFF]);
        }
        out
    }
}

impl std::fmt::Debug for NormalizedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Normalizes captured frames and encodes them for OCR.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    contrast: f32,
    jpeg_quality: u8,
}

impl Preprocessor {
    pub fn new(contrast: f32, jpeg_quality: u8) -> Self {
        Self {
            contrast,
            jpeg_quality,
        }
    }

    /// Converts a frame to normalized gray levels.
    pub fn normalize(&self, frame: &Frame) -> NormalizedFrame {
        let levels = frame
            .pixels()
            .chunks_exact(CHANNELS)
            .map(|px| normalize_pixel(px[0], px[1], px[2], self.contrast))
            .collect();

        NormalizedFrame::from_levels(levels, frame.width(), frame.height(), frame.sequence())
    }

    /// Encodes a normalized frame with the configured quality.
    pub fn encode(&self, frame: &NormalizedFrame) -> Result<EncodedImage, EncodeError> {
        encode_jpeg(frame, self.jpeg_quality)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRAST, 80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_gray_pixels() {
        let frame = Frame::new(vec![128, 128, 128, 255, 0, 0, 0, 255], 2, 1, 1);
        let normalized = Preprocessor::default().normalize(&frame);

        assert_eq!(normalized.levels(), &[128, 0]);
        assert_eq!(normalized.sequence(), 1);
    }

    #[test]
    fn test_rgba_channels_equal() {
        let frame = Frame::new(vec![200, 40, 90, 255], 1, 1, 1);
        let normalized = Preprocessor::default().normalize(&frame);
        let rgba = normalized.to_rgba();

        assert_eq!(rgba[0], rgba[1]);
        assert_eq!(rgba[1], rgba[2]);
        assert_eq!(rgba[3], 255);
    }

    #[test]
    fn test_contrast_widens_spread() {
        let frame = Frame::new(vec![100, 100, 100, 255, 160, 160, 160, 255], 2, 1, 1);
        let flat = Preprocessor::new(1.0, 80).normalize(&frame);
        let stretched = Preprocessor::new(1.3, 80).normalize(&frame);

        let spread = |f: &NormalizedFrame| f.levels()[1] - f.levels()[0];
        assert!(spread(&stretched) > spread(&flat));
    }
}
