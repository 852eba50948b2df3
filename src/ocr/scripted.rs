//! Replays canned OCR results.

use super::{OcrError, OcrText, TextExtractor};
use crate::preprocess::EncodedImage;
use std::collections::VecDeque;
use std::path::Path;

/// Text extractor that returns a fixed sequence of results, one per call.
///
/// Once the script runs out every call yields empty text, which the
/// signal extractor treats as "nothing seen".
#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    script: VecDeque<Result<String, String>>,
    calls: u64,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a script from successful reads.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines.into_iter().map(|l| Ok(l.into())).collect(),
            calls: 0,
        }
    }

    /// Loads a script file with one OCR read per line.
    ///
    /// A literal `\n` in a line becomes a newline in the returned text.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(content.lines().map(|l| l.replace("\\n", "\n"))))
    }

    /// Appends a successful read.
    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.script.push_back(Ok(text.into()));
        self
    }

    /// Appends a failed read.
    pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.script.push_back(Err(message.into()));
        self
    }

    /// Reads still queued.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Number of extraction calls served.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl TextExtractor for ScriptedExtractor {
    fn extract(&mut self, _image: &EncodedImage) -> Result<OcrText, OcrError> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(Ok(text)) => Ok(OcrText::new(text)),
            Some(Err(message)) => Err(OcrError::Engine(message)),
            None => Ok(OcrText::default()),
        }
    }
}
