//! In-process capture backend producing moving test-pattern frames.
//!
//! Devices can be unplugged, made to fail a number of opens, or have their
//! live streams cut, which is enough to drive every acquisition path.

use super::{CaptureBackend, DeviceCapability, DeviceId, DeviceInfo, LiveStream, ResolutionHint};
use crate::result::{BoothError, BoothResult};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct SyntheticDevice {
    info: DeviceInfo,
    tint: [u8; 3],
    failing_opens: u32,
}

#[derive(Debug, Default)]
struct BackendState {
    devices: Vec<SyntheticDevice>,
    open_attempts: Vec<Instant>,
    streams: Vec<Arc<AtomicBool>>,
    next_id: usize,
}

/// A backend whose devices are simulated in memory
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    state: Arc<Mutex<BackendState>>,
    live_streams: Arc<AtomicUsize>,
}

impl SyntheticBackend {
    /// Create a backend with no devices attached
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: attach a device with the given label
    #[must_use]
    pub fn with_device(self, label: &str) -> Self {
        self.attach(label);
        self
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a device and return its id
    pub fn attach(&self, label: &str) -> DeviceId {
        let mut state = self.lock();
        let n = state.next_id;
        state.next_id += 1;
        let id = DeviceId::new(format!("synthetic-{n}"));
        let tint = [
            (60 + n * 70 % 180) as u8,
            (90 + n * 40 % 150) as u8,
            (160 + n * 30 % 90) as u8,
        ];
        state.devices.push(SyntheticDevice {
            info: DeviceInfo {
                id: id.clone(),
                label: label.to_string(),
                capability: DeviceCapability::default(),
            },
            tint,
            failing_opens: 0,
        });
        id
    }

    /// Remove a device from the enumeration; its open streams keep running
    pub fn unplug(&self, id: &DeviceId) {
        self.lock().devices.retain(|d| &d.info.id != id);
    }

    /// Make the next `count` opens of a device fail
    pub fn fail_next_opens(&self, id: &DeviceId, count: u32) {
        if let Some(device) = self.lock().devices.iter_mut().find(|d| &d.info.id == id) {
            device.failing_opens = count;
        }
    }

    /// Cut every open stream: subsequent reads fail with `DeviceLost`
    pub fn lose_streams(&self) {
        for flag in &self.lock().streams {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Times at which `open` was attempted
    #[must_use]
    pub fn open_attempts(&self) -> Vec<Instant> {
        self.lock().open_attempts.clone()
    }

    /// Streams opened and not yet stopped
    #[must_use]
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn enumerate(&self) -> BoothResult<Vec<DeviceInfo>> {
        Ok(self.lock().devices.iter().map(|d| d.info.clone()).collect())
    }

    async fn open(
        &self,
        device: &DeviceInfo,
        hint: ResolutionHint,
    ) -> BoothResult<Box<dyn LiveStream>> {
        let mut state = self.lock();
        state.open_attempts.push(Instant::now());

        let Some(entry) = state.devices.iter_mut().find(|d| d.info.id == device.id) else {
            return Err(BoothError::DeviceLost {
                message: format!("{} is no longer attached", device.id),
            });
        };
        if entry.failing_opens > 0 {
            entry.failing_opens -= 1;
            return Err(BoothError::DeviceLost {
                message: format!("{} refused to open", device.id),
            });
        }

        let (width, height) = hint.resolve(&entry.info.capability);
        let frame_rate = entry.info.capability.frame_rate.max(1);
        let tint = entry.tint;
        let lost = Arc::new(AtomicBool::new(false));
        state.streams.push(Arc::clone(&lost));
        self.live_streams.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(SyntheticStream {
            device_id: device.id.clone(),
            width,
            height,
            frame_interval: Duration::from_secs(1) / frame_rate,
            tint,
            frame: 0,
            lost,
            stopped: false,
            live_streams: Arc::clone(&self.live_streams),
        }))
    }
}

/// Live stream produced by [`SyntheticBackend`]
#[derive(Debug)]
pub struct SyntheticStream {
    device_id: DeviceId,
    width: u32,
    height: u32,
    frame_interval: Duration,
    tint: [u8; 3],
    frame: u64,
    lost: Arc<AtomicBool>,
    stopped: bool,
    live_streams: Arc<AtomicUsize>,
}

impl SyntheticStream {
    fn render(&self) -> RgbaImage {
        // A bright bar sweeps across a tinted vertical gradient
        let bar_width = (self.width / 8).max(1);
        let bar_x = (self.frame * 8 % u64::from(self.width.max(1))) as u32;
        let [r, g, b] = self.tint;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            if x >= bar_x && x < bar_x + bar_width {
                return Rgba([250, 250, 250, 255]);
            }
            let shade = (y * 96 / self.height.max(1)) as u8;
            Rgba([
                r.saturating_sub(shade),
                g.saturating_sub(shade),
                b.saturating_sub(shade),
                255,
            ])
        })
    }
}

#[async_trait]
impl LiveStream for SyntheticStream {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn is_live(&self) -> bool {
        !self.stopped && !self.lost.load(Ordering::SeqCst)
    }

    async fn read_frame(&mut self) -> BoothResult<RgbaImage> {
        if !self.is_live() {
            return Err(BoothError::DeviceLost {
                message: format!("stream on {} ended", self.device_id),
            });
        }
        let frame = self.render();
        self.frame += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
