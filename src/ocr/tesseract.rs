//! Tesseract command-line extractor.

use super::{OcrError, OcrText, TextExtractor};
use crate::preprocess::EncodedImage;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Runs `tesseract stdin stdout -l <lang>` for every image.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    binary: String,
    language: String,
}

impl TesseractExtractor {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Builds the command line without running it.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Pipes `input` to a fresh engine process and collects its output.
    /// The child is always reaped, including when the write fails.
    fn run(&self, input: &[u8]) -> Result<Output, OcrError> {
        let mut child = self.command().spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(input) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }

        Ok(child.wait_with_output()?)
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&mut self, image: &EncodedImage) -> Result<OcrText, OcrError> {
        let output = self.run(image.bytes())?;
        if !output.status.success() {
            return Err(OcrError::Engine(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::trace!(
            sequence = image.sequence(),
            chars = text.len(),
            "Tesseract read complete"
        );
        Ok(OcrText::new(text))
    }
}
