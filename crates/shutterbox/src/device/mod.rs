//! Capture devices: enumeration, selection, and live streams.
//!
//! Backends implement [`CaptureBackend`]; the [`CaptureDeviceManager`] owns
//! selection, the bounded retry loop, and the single active stream.

mod manager;
mod synthetic;

pub use manager::{default_selection, CaptureDeviceManager, StreamGuard};
pub use synthetic::{SyntheticBackend, SyntheticStream};

use crate::result::BoothResult;
use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Backend-assigned device identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a device can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapability {
    /// Largest frame width
    pub max_width: u32,
    /// Largest frame height
    pub max_height: u32,
    /// Nominal frames per second
    pub frame_rate: u32,
}

impl Default for DeviceCapability {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            frame_rate: 30,
        }
    }
}

/// One enumerated capture device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Identifier used for selection
    pub id: DeviceId,
    /// Human-readable label
    pub label: String,
    /// Device capability
    pub capability: DeviceCapability,
}

/// Requested stream resolution; backends treat it as an ideal, not a minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionHint {
    /// Ideal width
    pub width: u32,
    /// Ideal height
    pub height: u32,
}

impl ResolutionHint {
    /// Create a hint
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp the hint to what a device supports
    #[must_use]
    pub fn resolve(self, capability: &DeviceCapability) -> (u32, u32) {
        (
            self.width.clamp(1, capability.max_width.max(1)),
            self.height.clamp(1, capability.max_height.max(1)),
        )
    }
}

impl Default for ResolutionHint {
    fn default() -> Self {
        Self::new(944, 708)
    }
}

/// A source of capture devices
#[async_trait]
pub trait CaptureBackend: Send + Sync + fmt::Debug {
    /// Enumerate attached devices (may be empty)
    async fn enumerate(&self) -> BoothResult<Vec<DeviceInfo>>;

    /// Open a live stream on `device`
    async fn open(
        &self,
        device: &DeviceInfo,
        hint: ResolutionHint,
    ) -> BoothResult<Box<dyn LiveStream>>;
}

/// A running preview/capture stream
#[async_trait]
pub trait LiveStream: Send + fmt::Debug {
    /// Device the stream belongs to
    fn device_id(&self) -> &DeviceId;

    /// Frame dimensions
    fn dimensions(&self) -> (u32, u32);

    /// Interval between frames
    fn frame_interval(&self) -> Duration;

    /// Whether tracks are still delivering frames
    fn is_live(&self) -> bool;

    /// Read the current frame
    async fn read_frame(&mut self) -> BoothResult<RgbaImage>;

    /// Stop all tracks; must be idempotent
    fn stop(&mut self);
}
