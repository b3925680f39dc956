//! Kiosk configuration (YAML).
//!
//! Every field has a default, so an empty document is a valid configuration
//! and the defaults are the standard kiosk timings.

use crate::device::ResolutionHint;
use crate::export::{SlotLayout, StripOrientation};
use crate::result::{BoothError, BoothResult};
use crate::session::KeyBindings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level kiosk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Device acquisition
    pub capture: CaptureConfig,
    /// Shot sequencing
    pub session: SessionConfig,
    /// Artifact rendering
    pub export: ExportConfig,
    /// Operator key bindings
    pub bindings: KeyBindings,
}

impl BoothConfig {
    /// Parse YAML
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or fails validation
    pub fn from_yaml_str(yaml: &str) -> BoothResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> BoothResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> BoothResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check every section
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found
    pub fn validate(&self) -> BoothResult<()> {
        self.capture.validate()?;
        self.session.validate()?;
        self.export.validate()?;
        self.bindings.validate()
    }
}

/// Device acquisition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Ideal stream resolution
    pub resolution: ResolutionHint,
    /// Total open attempts per acquisition
    pub acquire_attempts: u32,
    /// Pause between attempts
    pub retry_backoff_ms: u64,
    /// Pause before a background re-acquisition after a terminal failure
    pub reacquire_interval_ms: u64,
    /// Label fragment of the preferred default device
    pub preferred_signature: String,
    /// Explicit device id; falls back to the default selection when absent
    pub preferred_device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionHint::default(),
            acquire_attempts: 3,
            retry_backoff_ms: 1_500,
            reacquire_interval_ms: 5_000,
            preferred_signature: "OBS".to_string(),
            preferred_device: None,
        }
    }
}

impl CaptureConfig {
    /// Pause between attempts
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Pause before background re-acquisition
    #[must_use]
    pub const fn reacquire_interval(&self) -> Duration {
        Duration::from_millis(self.reacquire_interval_ms)
    }

    fn validate(&self) -> BoothResult<()> {
        if self.acquire_attempts == 0 {
            return Err(BoothError::config("capture.acquire_attempts must be at least 1"));
        }
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(BoothError::config("capture.resolution must be non-empty"));
        }
        if self.reacquire_interval_ms == 0 {
            return Err(BoothError::config("capture.reacquire_interval_ms must be positive"));
        }
        Ok(())
    }
}

/// Shot sequencing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown start value (one cue per tick)
    pub countdown_from: u8,
    /// Countdown tick length
    pub tick_ms: u64,
    /// Idle time in `Captured` before the slot is accepted automatically
    pub auto_advance_ms: u64,
    /// Retake confirmation notice
    pub retake_confirm_ms: u64,
    /// Retake-exhausted notice before the forced accept
    pub retake_exhausted_ms: u64,
    /// JPEG quality of recorded clip chunks
    pub clip_jpeg_quality: u8,
    /// Chunk cap per clip; older chunks are dropped first
    pub max_clip_chunks: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_from: 5,
            tick_ms: 1_000,
            auto_advance_ms: 10_000,
            retake_confirm_ms: 1_500,
            retake_exhausted_ms: 3_000,
            clip_jpeg_quality: 80,
            max_clip_chunks: 600,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> BoothResult<()> {
        let timings = [
            ("tick_ms", self.tick_ms),
            ("auto_advance_ms", self.auto_advance_ms),
            ("retake_confirm_ms", self.retake_confirm_ms),
            ("retake_exhausted_ms", self.retake_exhausted_ms),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, ms)| *ms == 0) {
            return Err(BoothError::config(format!("session.{name} must be positive")));
        }
        if self.countdown_from == 0 {
            return Err(BoothError::config("session.countdown_from must be at least 1"));
        }
        if self.max_clip_chunks == 0 {
            return Err(BoothError::config("session.max_clip_chunks must be positive"));
        }
        Ok(())
    }
}

/// Strip pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Canvas and slot windows
    pub layout: SlotLayout,
    /// Draw the selected background over the stills
    pub framed: bool,
}

impl StripConfig {
    /// Plain white grid strip without background artwork
    #[must_use]
    pub fn plain(orientation: StripOrientation) -> Self {
        Self {
            layout: SlotLayout::grid_strip(orientation),
            framed: false,
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            layout: SlotLayout::framed_strip(),
            framed: true,
        }
    }
}

/// Artifact rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Highlight video frame rate
    pub fps: u32,
    /// Highlight video duration cap in seconds
    pub max_highlight_secs: f64,
    /// Distance kept from a clip's end when seeking
    pub seek_epsilon_secs: f64,
    /// JPEG quality of highlight video frames
    pub frame_jpeg_quality: u8,
    /// Delay between loop animation frames
    pub loop_interval_ms: u32,
    /// Loop animation frame width
    pub loop_width: u32,
    /// Loop animation frame height
    pub loop_height: u32,
    /// GIF quantizer quality (1-100)
    pub loop_quality: u8,
    /// Overlay artwork (PNG) for every loop frame; a generated border when unset
    pub loop_frame: Option<PathBuf>,
    /// Strip pipeline
    pub strip: StripConfig,
    /// Highlight video canvas
    pub highlight_layout: SlotLayout,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            max_highlight_secs: 3.0,
            seek_epsilon_secs: 0.1,
            frame_jpeg_quality: 90,
            loop_interval_ms: 500,
            loop_width: 1920,
            loop_height: 1240,
            loop_quality: 80,
            loop_frame: None,
            strip: StripConfig::default(),
            highlight_layout: SlotLayout::highlight(),
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> BoothResult<()> {
        if !(1..=60).contains(&self.fps) {
            return Err(BoothError::config(format!(
                "export.fps must be within 1..=60, got {}",
                self.fps
            )));
        }
        if !(self.max_highlight_secs.is_finite() && self.max_highlight_secs > 0.0) {
            return Err(BoothError::config("export.max_highlight_secs must be positive"));
        }
        if !(self.seek_epsilon_secs.is_finite() && self.seek_epsilon_secs >= 0.0) {
            return Err(BoothError::config("export.seek_epsilon_secs must not be negative"));
        }
        if self.loop_interval_ms < 10 {
            return Err(BoothError::config("export.loop_interval_ms must be at least 10"));
        }
        if self.loop_width == 0 || self.loop_height == 0 {
            return Err(BoothError::config("export loop frames must be non-empty"));
        }
        self.strip.layout.validate()?;
        self.highlight_layout.validate()
    }
}
