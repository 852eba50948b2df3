//! Video input and frame handling.
//!
//! This module provides abstractions for reading stills from a live
//! video source. The scan loop never holds more than the current frame.

#[cfg(feature = "camera")]
mod camera;
mod config;
mod frame;
mod source;

#[cfg(feature = "camera")]
pub use camera::CameraSource;
pub use config::CaptureConfig;
pub use frame::{Frame, CHANNELS};
pub use source::{MockVideoSource, VideoError, VideoSource};
