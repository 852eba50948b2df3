//! Compressed image payloads for the text-extraction collaborator.

use super::NormalizedFrame;
use image::{codecs::jpeg::JpegEncoder, ColorType};
use thiserror::Error;

/// Errors raised while encoding a normalized frame.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame has no pixels")]
    EmptyFrame,
    #[error("expected {expected} gray levels for the frame size, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// An encoded image ready for OCR.
#[derive(Clone)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl EncodedImage {
    /// Mime type of the payload.
    pub const MIME: &'static str = "image/jpeg";

    /// Returns the encoded bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number of the source frame.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Encodes a normalized frame as JPEG.
///
/// All three color channels carry the same level after normalization,
/// so a single luma plane is encoded.
pub fn encode_jpeg(frame: &NormalizedFrame, quality: u8) -> Result<EncodedImage, EncodeError> {
    if frame.levels().is_empty() {
        return Err(EncodeError::EmptyFrame);
    }
    let expected = frame.width() as usize * frame.height() as usize;
    if frame.levels().len() != expected {
        return Err(EncodeError::BufferMismatch {
            expected,
            actual: frame.levels().len(),
        });
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode(
        frame.levels(),
        frame.width(),
        frame.height(),
        ColorType::L8,
    )?;

    Ok(EncodedImage {
        bytes,
        width: frame.width(),
        height: frame.height(),
        sequence: frame.sequence(),
    })
}
