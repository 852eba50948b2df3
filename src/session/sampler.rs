//! Frame sampling: capture, normalize, encode, read.

use crate::capture::{VideoError, VideoSource};
use crate::ocr::{OcrError, OcrText, TextExtractor};
use crate::preprocess::{EncodeError, NormalizedFrame, Preprocessor};
use thiserror::Error;
use tracing::trace;

/// Why a sample produced no text.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("video source not ready")]
    NotReady,
    #[error("capture failed: {0}")]
    Capture(#[from] VideoError),
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("ocr failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Turns the current video frame into OCR text.
pub struct FrameSampler<S, X> {
    source: S,
    extractor: X,
    preprocessor: Preprocessor,
    retain_last_frame: bool,
    last_frame: Option<NormalizedFrame>,
}

impl<S: VideoSource, X: TextExtractor> FrameSampler<S, X> {
    pub fn new(source: S, extractor: X, preprocessor: Preprocessor) -> Self {
        Self {
            source,
            extractor,
            preprocessor,
            retain_last_frame: false,
            last_frame: None,
        }
    }

    /// Keeps the most recent normalized frame for inspection.
    pub fn retain_last_frame(mut self, retain: bool) -> Self {
        self.retain_last_frame = retain;
        self
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.source.is_ready()
    }

    /// Samples one frame.
    pub fn sample(&mut self) -> Result<OcrText, SampleError> {
        if !self.source.is_ready() {
            return Err(SampleError::NotReady);
        }

        let frame = self.source.capture()?;
        if !frame.is_valid() {
            return Err(VideoError::CaptureFailed(format!(
                "frame {} has {} bytes for {}x{}",
                frame.sequence(),
                frame.pixels().len(),
                frame.width(),
                frame.height()
            ))
            .into());
        }
        let normalized = self.preprocessor.normalize(&frame);
        let image = self.preprocessor.encode(&normalized)?;
        if self.retain_last_frame {
            self.last_frame = Some(normalized);
        }

        let text = self.extractor.extract(&image)?;
        trace!(
            sequence = image.sequence(),
            bytes = image.bytes().len(),
            chars = text.text.len(),
            "Frame sampled"
        );
        Ok(text)
    }

    /// Most recent normalized frame, when retention is on.
    pub fn last_frame(&self) -> Option<&NormalizedFrame> {
        self.last_frame.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Releases the source and extractor.
    pub fn into_parts(self) -> (S, X) {
        (self.source, self.extractor)
    }
}

impl<S, X> std::fmt::Debug for FrameSampler<S, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSampler")
            .field("preprocessor", &self.preprocessor)
            .field("retain_last_frame", &self.retain_last_frame)
            .field("has_last_frame", &self.last_frame.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, MockVideoSource};
    use crate::ocr::ScriptedExtractor;

    fn opened_source() -> MockVideoSource {
        let mut source = MockVideoSource::new();
        source.open(&CaptureConfig::with_dimensions(32, 16)).unwrap();
        source
    }

    #[test]
    fn test_sample_reads_script() {
        let extractor = ScriptedExtractor::from_lines(["COLLEGE ID 12345"]);
        let mut sampler = FrameSampler::new(opened_source(), extractor, Preprocessor::default());

        assert_eq!(sampler.sample().unwrap().text, "COLLEGE ID 12345");
        assert_eq!(sampler.source().frames_captured(), 1);
        assert!(sampler.last_frame().is_none());
    }

    #[test]
    fn test_not_ready_skips_capture() {
        let mut source = opened_source();
        source.set_ready(false);
        let mut sampler = FrameSampler::new(source, ScriptedExtractor::new(), Preprocessor::default());

        assert!(matches!(sampler.sample(), Err(SampleError::NotReady)));
        assert_eq!(sampler.extractor().calls(), 0);
    }

    #[test]
    fn test_retains_normalized_frame() {
        let mut sampler = FrameSampler::new(
            opened_source(),
            ScriptedExtractor::new(),
            Preprocessor::default(),
        )
        .retain_last_frame(true);

        sampler.sample().unwrap();
        let frame = sampler.last_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 16));
    }

    #[test]
    fn test_ocr_failure_surfaces() {
        let mut extractor = ScriptedExtractor::new();
        extractor.push_failure("engine crashed");
        let mut sampler = FrameSampler::new(opened_source(), extractor, Preprocessor::default());

        assert!(matches!(sampler.sample(), Err(SampleError::Ocr(_))));
    }

    struct ShortFrameSource;

    impl VideoSource for ShortFrameSource {
        fn open(&mut self, _config: &CaptureConfig) -> Result<(), VideoError> {
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn capture(&mut self) -> Result<crate::capture::Frame, VideoError> {
            Ok(crate::capture::Frame::new(vec![0; 10], 4, 4, 1))
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_malformed_frame_is_capture_failure() {
        let mut sampler =
            FrameSampler::new(ShortFrameSource, ScriptedExtractor::new(), Preprocessor::default());

        assert!(matches!(
            sampler.sample(),
            Err(SampleError::Capture(VideoError::CaptureFailed(_)))
        ));
        assert_eq!(sampler.extractor().calls(), 0);
    }
}
