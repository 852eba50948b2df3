//! Text extraction collaborators.
//!
//! OCR output is best-effort: it may be empty, noisy, or garbage. The
//! only guaranteed field of a result is its text.

mod scripted;
mod tesseract;

pub use scripted::ScriptedExtractor;
pub use tesseract::TesseractExtractor;

use crate::preprocess::EncodedImage;
use thiserror::Error;

/// Errors a text extractor can report.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to launch ocr engine: {0}")]
    Launch(#[from] std::io::Error),
    #[error("ocr engine failed: {0}")]
    Engine(String),
}

/// Plain text extracted from one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrText {
    pub text: String,
}

impl OcrText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// True when there is nothing but whitespace to read.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait for text extraction engines.
pub trait TextExtractor {
    /// Extracts plain text from an encoded image.
    fn extract(&mut self, image: &EncodedImage) -> Result<OcrText, OcrError>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract(&mut self, image: &EncodedImage) -> Result<OcrText, OcrError> {
        (**self).extract(image)
    }
}
