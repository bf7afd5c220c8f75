use serde::Deserialize;
use std::path::Path;

use crate::frame::PixelFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stream: StreamConfig,
    pub subtitles: SubtitleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Geometry and endpoints of the raw video stream flowing through the filter.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Path to read raw frames from, or "-" for stdin.
    #[serde(default = "default_stdio")]
    pub input: String,
    /// Path to write selected frames to, or "-" for stdout.
    #[serde(default = "default_stdio")]
    pub output: String,
    /// Upper bound on the size of a single frame clone. Unset means unlimited.
    #[serde(default)]
    pub max_frame_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleConfig {
    /// WebVTT file whose cue start times drive the freeze points.
    pub path: String,
    /// Shift applied to every cue start, in milliseconds. May be negative.
    #[serde(default)]
    pub dialogue_offset_ms: i64,
    /// Longest time one anchor frame is shown. Once a hold reaches this
    /// length the current frame is anchored again. Unset means hold until
    /// the next cue.
    #[serde(default)]
    pub max_hold_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.width == 0 || self.stream.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "stream dimensions must be non-zero, got {}x{}",
                self.stream.width, self.stream.height
            )));
        }
        let format = self
            .stream
            .pixel_format
            .parse::<PixelFormat>()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if format
            .frame_len(self.stream.width, self.stream.height)
            .is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "{}x{} {format} frames are too large",
                self.stream.width, self.stream.height
            )));
        }
        if self.subtitles.max_hold_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "subtitles.max_hold_ms must be positive".into(),
            ));
        }
        if !(self.stream.fps.is_finite() && self.stream.fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "stream.fps must be positive, got {}",
                self.stream.fps
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_pixel_format() -> String {
    "rgb24".into()
}
fn default_fps() -> f64 {
    24.0
}
fn default_stdio() -> String {
    "-".into()
}
fn default_log_level() -> String {
    "info".into()
}
