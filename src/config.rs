//! Configuration file format.
//!
//! Every section is optional; a missing section falls back to the
//! reference behavior (200 ms sampling, 5 s recency window, 1.3 contrast).

use crate::campus::StudentRow;
use crate::capture::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("sampling interval must be non-zero")]
    InvalidInterval,
    #[error("recency window must be non-zero")]
    InvalidWindow,
    #[error("contrast factor must be positive, got {0}")]
    InvalidContrast(f32),
    #[error("jpeg quality must be 1-100, got {0}")]
    InvalidJpegQuality(u8),
    #[error("roll number length must be positive")]
    InvalidRollNoLength,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Scan loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Milliseconds between sampling ticks.
    pub sample_interval_ms: u64,
    /// Milliseconds an observed signal stays live.
    pub recency_window_ms: u64,
    /// Linear contrast factor applied around mid-gray.
    pub contrast: f32,
    /// JPEG quality for the payload handed to OCR.
    pub jpeg_quality: u8,
    /// Keep the most recent normalized frame for inspection.
    pub retain_last_frame: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 200,
            recency_window_ms: 5000,
            contrast: 1.3,
            jpeg_quality: 80,
            retain_last_frame: false,
        }
    }
}

impl ScanConfig {
    /// Returns the sampling interval.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Returns how long an observed signal stays live.
    pub fn recency_window(&self) -> Duration {
        Duration::from_millis(self.recency_window_ms)
    }

    /// Validates the scan parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.recency_window_ms == 0 {
            return Err(ConfigError::InvalidWindow);
        }
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(ConfigError::InvalidContrast(self.contrast));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

/// Which text extraction backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    /// Replays text from a script file, one line per tick.
    #[default]
    Scripted,
    /// Shells out to the Tesseract command-line tool.
    Tesseract,
}

/// Text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngine,
    /// Path or name of the tesseract binary.
    pub tesseract_bin: String,
    /// Tesseract language pack.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngine::default(),
            tesseract_bin: "tesseract".into(),
            language: "eng".into(),
        }
    }
}

/// Organization the scanner is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub name: String,
    pub access_code: String,
    pub validation_keywords: Vec<String>,
    pub roll_no_length: usize,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "Demo Campus".into(),
            access_code: "changeme".into(),
            validation_keywords: Vec::new(),
            roll_no_length: 5,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { metrics_port: 0 }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub students: Vec<StudentRow>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        self.capture.validate()?;
        if self.organization.roll_no_length == 0 {
            return Err(ConfigError::InvalidRollNoLength);
        }
        Ok(())
    }
}
