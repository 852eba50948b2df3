//! Hardware camera source backed by `nokhwa`.

use super::{CaptureConfig, Frame, VideoError, VideoSource};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};

/// Live camera video source.
pub struct CameraSource {
    camera: Option<Camera>,
    sequence: u64,
}

impl CameraSource {
    pub fn new() -> Self {
        Self {
            camera: None,
            sequence: 0,
        }
    }
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for CameraSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), VideoError> {
        config
            .validate()
            .map_err(|e| VideoError::ConfigFailed(e.to_string()))?;

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                config.fps,
            ),
        ));
        let mut camera = Camera::new(CameraIndex::Index(config.device_id), format)
            .map_err(|e| VideoError::DeviceNotFound(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| VideoError::OpenFailed(e.to_string()))?;

        tracing::info!(
            device = config.device_id,
            width = camera.resolution().width(),
            height = camera.resolution().height(),
            "Camera opened"
        );
        self.camera = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.camera
            .as_ref()
            .map(Camera::is_stream_open)
            .unwrap_or(false)
    }

    fn capture(&mut self) -> Result<Frame, VideoError> {
        let camera = self.camera.as_mut().ok_or(VideoError::NotInitialized)?;
        let buffer = camera
            .frame()
            .map_err(|e| VideoError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| VideoError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = decoded.dimensions();
        Ok(Frame::from_rgb(decoded.as_raw(), width, height, self.sequence))
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "Failed to stop camera stream");
            }
            tracing::info!("Camera closed");
        }
    }
}
