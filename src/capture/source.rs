//! Video source abstraction for frame capture.
//!
//! The scan loop only needs two things from a video source: whether a
//! readable frame is available right now, and a copy of that frame.

use super::{frame::CHANNELS, CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during video source operations.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open video source: {0}")]
    OpenFailed(String),
    #[error("failed to configure video source: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("video source not initialized")]
    NotInitialized,
}

/// Trait for live video sources.
pub trait VideoSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), VideoError>;

    /// Returns true when a current frame can be read.
    fn is_ready(&self) -> bool;

    /// Copies the current frame.
    fn capture(&mut self) -> Result<Frame, VideoError>;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

impl<T: VideoSource + ?Sized> VideoSource for Box<T> {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), VideoError> {
        (**self).open(config)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn capture(&mut self) -> Result<Frame, VideoError> {
        (**self).capture()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Synthetic video source for tests and demos.
///
/// Produces a horizontal gradient so that preprocessing has real work
/// to do. Readiness can be toggled to exercise the not-ready path.
#[derive(Debug)]
pub struct MockVideoSource {
    config: Option<CaptureConfig>,
    sequence: u64,
    ready: bool,
}

impl MockVideoSource {
    pub fn new() -> Self {
        Self {
            config: None,
            sequence: 0,
            ready: true,
        }
    }

    /// Marks the source as ready or not ready.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Number of frames captured so far.
    pub fn frames_captured(&self) -> u64 {
        self.sequence
    }
}

impl Default for MockVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for MockVideoSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), VideoError> {
        config
            .validate()
            .map_err(|e| VideoError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            width = config.width,
            height = config.height,
            "Mock video source opened"
        );
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.config.is_some() && self.ready
    }

    fn capture(&mut self) -> Result<Frame, VideoError> {
        let config = self.config.as_ref().ok_or(VideoError::NotInitialized)?;
        if !self.ready {
            return Err(VideoError::CaptureFailed("source not ready".into()));
        }

        let width = config.width as usize;
        let pixel_count = width * config.height as usize;
        let mut pixels = Vec::with_capacity(pixel_count * CHANNELS);
        for i in 0..pixel_count {
            let x = i % width;
            let level = ((x * 255) / width.max(1)) as u8;
            pixels.extend_from_slice(&[level, level.wrapping_add(self.sequence as u8), level, 0xFF]);
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, config.width, config.height, self.sequence))
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("Mock video source closed");
    }
}
