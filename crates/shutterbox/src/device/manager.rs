//! Device selection, bounded acquisition retry, and the active stream.

use super::{CaptureBackend, DeviceId, DeviceInfo, LiveStream, ResolutionHint};
use crate::config::CaptureConfig;
use crate::result::{BoothError, BoothResult};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns a live stream and stops its tracks when dropped
#[derive(Debug)]
pub struct StreamGuard {
    stream: Box<dyn LiveStream>,
}

impl StreamGuard {
    /// Take ownership of an open stream
    #[must_use]
    pub fn new(stream: Box<dyn LiveStream>) -> Self {
        Self { stream }
    }

    /// Device the stream belongs to
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        self.stream.device_id()
    }

    /// Frame interval of the stream
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.stream.frame_interval()
    }

    /// Whether the stream still delivers frames
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.stream.is_live()
    }

    /// Read the current frame
    ///
    /// # Errors
    ///
    /// Returns `DeviceLost` if the tracks ended
    pub async fn read_frame(&mut self) -> BoothResult<RgbaImage> {
        self.stream.read_frame().await
    }

    /// Borrow the underlying stream
    #[must_use]
    pub fn as_stream(&self) -> &dyn LiveStream {
        self.stream.as_ref()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        debug!(device = %self.stream.device_id(), "stopping stream tracks");
        self.stream.stop();
    }
}

/// Default device choice: the first label containing `signature`
/// (case-insensitive), otherwise the first device
#[must_use]
pub fn default_selection(devices: &[DeviceInfo], signature: &str) -> Option<DeviceId> {
    let needle = signature.to_lowercase();
    devices
        .iter()
        .find(|d| !needle.is_empty() && d.label.to_lowercase().contains(&needle))
        .or_else(|| devices.first())
        .map(|d| d.id.clone())
}

/// Selects a capture device and keeps at most one stream open on it
#[derive(Debug)]
pub struct CaptureDeviceManager {
    backend: Arc<dyn CaptureBackend>,
    config: CaptureConfig,
    devices: Vec<DeviceInfo>,
    selected: Option<DeviceId>,
    active: Option<StreamGuard>,
}

impl CaptureDeviceManager {
    /// Create a manager over a backend
    #[must_use]
    pub fn new(backend: Arc<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        let selected = config.preferred_device.as_deref().map(DeviceId::from);
        Self {
            backend,
            config,
            devices: Vec::new(),
            selected,
            active: None,
        }
    }

    /// Refresh and return the device enumeration (may be empty)
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot enumerate
    pub async fn list_devices(&mut self) -> BoothResult<&[DeviceInfo]> {
        self.devices = self.backend.enumerate().await?;
        debug!(count = self.devices.len(), "enumerated capture devices");
        Ok(&self.devices)
    }

    /// Last enumeration
    #[must_use]
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Preferred device id, if any
    #[must_use]
    pub fn selected(&self) -> Option<&DeviceId> {
        self.selected.as_ref()
    }

    /// Mark a device preferred, falling back to the first enumerated device
    ///
    /// Changing the selection releases the active stream.
    pub fn select_device(&mut self, id: &str) -> Option<DeviceId> {
        let resolved = self
            .devices
            .iter()
            .find(|d| d.id.as_str() == id)
            .or_else(|| self.devices.first())
            .map(|d| d.id.clone());

        if resolved != self.selected {
            info!(requested = id, selected = ?resolved, "capture device selection changed");
            self.release();
            self.selected.clone_from(&resolved);
        }
        resolved
    }

    /// Whether a stream is open and live
    #[must_use]
    pub fn has_live_stream(&self) -> bool {
        self.active.as_ref().is_some_and(StreamGuard::is_live)
    }

    /// The active stream
    pub fn stream(&mut self) -> Option<&mut StreamGuard> {
        self.active.as_mut()
    }

    /// Open a stream on the selected device, retrying with a fixed backoff
    ///
    /// Any active stream is released first. The selection is re-resolved
    /// against a fresh enumeration on every attempt.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` once every attempt has failed
    pub async fn acquire_stream(&mut self, hint: ResolutionHint) -> BoothResult<&mut StreamGuard> {
        let attempts = self.config.acquire_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.try_acquire(hint).await {
                Ok(_) => break,
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "capture stream acquisition failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_backoff()).await;
                    }
                }
            }
        }

        match self.active {
            Some(ref mut guard) => Ok(guard),
            None => Err(BoothError::DeviceUnavailable {
                attempts,
                message: last_error,
            }),
        }
    }

    /// One acquisition attempt without retries or backoff
    ///
    /// Callers that must stay responsive between attempts schedule the
    /// retries themselves.
    ///
    /// # Errors
    ///
    /// Returns the enumeration or open error of this attempt
    pub async fn try_acquire(&mut self, hint: ResolutionHint) -> BoothResult<&mut StreamGuard> {
        self.release();
        let stream = self.open_selected(hint).await?;
        info!(device = %stream.device_id(), "capture stream acquired");
        Ok(self.active.insert(StreamGuard::new(stream)))
    }

    /// Stop the active stream; idempotent
    pub fn release(&mut self) {
        if let Some(guard) = self.active.take() {
            info!(device = %guard.device_id(), "releasing capture stream");
        }
    }

    async fn open_selected(&mut self, hint: ResolutionHint) -> BoothResult<Box<dyn LiveStream>> {
        self.devices = self.backend.enumerate().await?;

        let device = self
            .selected
            .as_ref()
            .and_then(|id| self.devices.iter().find(|d| &d.id == id))
            .or_else(|| {
                default_selection(&self.devices, &self.config.preferred_signature)
                    .and_then(|id| self.devices.iter().find(|d| d.id == id))
            })
            .cloned()
            .ok_or_else(|| BoothError::DeviceLost {
                message: "no capture devices attached".to_string(),
            })?;

        if self.selected.as_ref() != Some(&device.id) {
            debug!(device = %device.id, label = %device.label, "resolved capture device");
            self.selected = Some(device.id.clone());
        }
        self.backend.open(&device, hint).await
    }
}

impl Drop for CaptureDeviceManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SyntheticBackend;

    fn small() -> ResolutionHint {
        ResolutionHint::new(16, 12)
    }

    fn manager(backend: &SyntheticBackend) -> CaptureDeviceManager {
        CaptureDeviceManager::new(Arc::new(backend.clone()), CaptureConfig::default())
    }

    mod selection {
        use super::*;

        fn info(id: &str, label: &str) -> DeviceInfo {
            DeviceInfo {
                id: DeviceId::from(id),
                label: label.to_string(),
                capability: crate::device::DeviceCapability::default(),
            }
        }

        #[test]
        fn test_default_prefers_signature() {
            let devices = [info("a", "FaceTime HD"), info("b", "OBS Virtual Camera")];
            assert_eq!(default_selection(&devices, "obs"), Some(DeviceId::from("b")));
        }

        #[test]
        fn test_default_falls_back_to_first() {
            let devices = [info("a", "FaceTime HD"), info("b", "USB Camera")];
            assert_eq!(default_selection(&devices, "OBS"), Some(DeviceId::from("a")));
            assert_eq!(default_selection(&[], "OBS"), None);
        }

        #[tokio::test]
        async fn test_select_unknown_falls_back_to_first() {
            let backend = SyntheticBackend::new().with_device("one").with_device("two");
            let mut manager = manager(&backend);
            manager.list_devices().await.unwrap();
            let chosen = manager.select_device("missing");
            assert_eq!(chosen, Some(DeviceId::from("synthetic-0")));
        }

        #[tokio::test]
        async fn test_select_with_no_devices() {
            let backend = SyntheticBackend::new();
            let mut manager = manager(&backend);
            manager.list_devices().await.unwrap();
            assert_eq!(manager.select_device("anything"), None);
        }

        #[tokio::test]
        async fn test_selection_change_releases_stream() {
            let backend = SyntheticBackend::new().with_device("one").with_device("two");
            let mut manager = manager(&backend);
            manager.list_devices().await.unwrap();
            manager.select_device("synthetic-0");
            manager.acquire_stream(small()).await.unwrap();
            assert_eq!(backend.live_streams(), 1);

            manager.select_device("synthetic-1");
            assert_eq!(backend.live_streams(), 0);
            assert!(!manager.has_live_stream());

            let guard = manager.acquire_stream(small()).await.unwrap();
            assert_eq!(guard.device_id(), &DeviceId::from("synthetic-1"));
        }
    }

    mod acquisition {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_zero_devices_three_attempts() {
            let backend = SyntheticBackend::new();
            let mut manager = manager(&backend);
            let started = tokio::time::Instant::now();

            let result = manager.acquire_stream(small()).await;
            assert!(matches!(
                result,
                Err(BoothError::DeviceUnavailable { attempts: 3, .. })
            ));
            assert_eq!(started.elapsed(), Duration::from_millis(3_000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_retry_spacing() {
            let backend = SyntheticBackend::new();
            let id = backend.attach("cam");
            backend.fail_next_opens(&id, 5);
            let mut manager = manager(&backend);

            assert!(manager.acquire_stream(small()).await.is_err());
            let attempts = backend.open_attempts();
            assert_eq!(attempts.len(), 3);
            for pair in attempts.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::from_millis(1_500));
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_recovers_on_later_attempt() {
            let backend = SyntheticBackend::new();
            let id = backend.attach("cam");
            backend.fail_next_opens(&id, 2);
            let mut manager = manager(&backend);

            assert!(manager.acquire_stream(small()).await.is_ok());
            assert_eq!(backend.open_attempts().len(), 3);
            assert!(manager.has_live_stream());
        }

        #[tokio::test(start_paused = true)]
        async fn test_try_acquire_makes_one_attempt() {
            let backend = SyntheticBackend::new();
            let id = backend.attach("cam");
            backend.fail_next_opens(&id, 1);
            let mut manager = manager(&backend);
            let started = tokio::time::Instant::now();

            assert!(manager.try_acquire(small()).await.is_err());
            assert_eq!(started.elapsed(), Duration::ZERO);
            assert_eq!(backend.open_attempts().len(), 1);
            assert!(!manager.has_live_stream());

            assert!(manager.try_acquire(small()).await.is_ok());
            assert_eq!(backend.live_streams(), 1);
        }

        #[tokio::test]
        async fn test_single_active_stream() {
            let backend = SyntheticBackend::new().with_device("cam");
            let mut manager = manager(&backend);
            manager.acquire_stream(small()).await.unwrap();
            manager.acquire_stream(small()).await.unwrap();
            assert_eq!(backend.live_streams(), 1);
        }

        #[tokio::test]
        async fn test_prefers_signature_device() {
            let backend = SyntheticBackend::new()
                .with_device("Integrated Webcam")
                .with_device("OBS Virtual Camera");
            let mut manager = manager(&backend);
            let guard = manager.acquire_stream(small()).await.unwrap();
            assert_eq!(guard.device_id(), &DeviceId::from("synthetic-1"));
        }

        #[tokio::test]
        async fn test_unplugged_selection_re_resolves() {
            let backend = SyntheticBackend::new();
            let first = backend.attach("one");
            backend.attach("two");
            let mut manager = manager(&backend);
            manager.list_devices().await.unwrap();
            manager.select_device(first.as_str());
            backend.unplug(&first);

            let guard = manager.acquire_stream(small()).await.unwrap();
            assert_eq!(guard.device_id(), &DeviceId::from("synthetic-1"));
        }
    }

    mod release {
        use super::*;

        #[tokio::test]
        async fn test_release_is_idempotent() {
            let backend = SyntheticBackend::new().with_device("cam");
            let mut manager = manager(&backend);
            manager.acquire_stream(small()).await.unwrap();
            manager.release();
            manager.release();
            assert_eq!(backend.live_streams(), 0);
        }

        #[tokio::test]
        async fn test_drop_releases_stream() {
            let backend = SyntheticBackend::new().with_device("cam");
            {
                let mut manager = manager(&backend);
                manager.acquire_stream(small()).await.unwrap();
                assert_eq!(backend.live_streams(), 1);
            }
            assert_eq!(backend.live_streams(), 0);
        }
    }
}
