//! Short clips recorded around each still.
//!
//! The recorder is armed when a countdown starts, receives frames from the
//! controller's pump, and is stopped in the same step that captures the
//! still. Frames are kept as JPEG chunks stamped with the session clock.

use crate::clock::SharedClock;
use crate::device::LiveStream;
use crate::export::encode_jpeg;
use crate::result::{BoothError, BoothResult};
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One encoded frame, timestamped relative to the clip start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipChunk {
    /// Milliseconds since the first chunk
    pub timestamp_ms: u64,
    /// JPEG bytes
    pub jpeg: Vec<u8>,
}

#[derive(Debug)]
struct ClipData {
    slot: usize,
    width: u32,
    height: u32,
    duration_ms: u64,
    chunks: Vec<ClipChunk>,
}

/// A finished clip; cheap to clone
#[derive(Debug, Clone)]
pub struct VideoClip {
    data: Arc<ClipData>,
}

impl VideoClip {
    /// Assemble a clip from chunks
    ///
    /// # Errors
    ///
    /// Returns `ClipUnavailable` when there are no chunks, timestamps go
    /// backwards, or the duration does not cover the last chunk
    pub fn new(
        slot: usize,
        (width, height): (u32, u32),
        duration_ms: u64,
        chunks: Vec<ClipChunk>,
    ) -> BoothResult<Self> {
        let unavailable = |message: &str| BoothError::ClipUnavailable {
            slot,
            message: message.to_string(),
        };
        let Some(last) = chunks.last() else {
            return Err(unavailable("no frames recorded"));
        };
        if duration_ms <= last.timestamp_ms {
            return Err(unavailable("duration does not cover the recorded frames"));
        }
        if chunks.windows(2).any(|w| w[1].timestamp_ms < w[0].timestamp_ms) {
            return Err(unavailable("chunk timestamps are not ordered"));
        }
        Ok(Self {
            data: Arc::new(ClipData {
                slot,
                width,
                height,
                duration_ms,
                chunks,
            }),
        })
    }

    /// Slot the clip belongs to
    #[must_use]
    pub fn slot(&self) -> usize {
        self.data.slot
    }

    /// Frame size
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.data.width, self.data.height)
    }

    /// Clip length
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.data.duration_ms)
    }

    /// Clip length in seconds
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.data.duration_ms as f64 / 1000.0
    }

    /// Recorded chunks
    #[must_use]
    pub fn chunks(&self) -> &[ClipChunk] {
        &self.data.chunks
    }

    /// Index of the chunk shown at `t_secs` (the last one starting at or before it)
    #[must_use]
    pub fn chunk_index_at(&self, t_secs: f64) -> usize {
        let t_ms = (t_secs.max(0.0) * 1000.0).round() as u64;
        self.data
            .chunks
            .partition_point(|c| c.timestamp_ms <= t_ms)
            .saturating_sub(1)
    }

    /// Decode one chunk
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range or the JPEG is corrupt
    pub fn decode_chunk(&self, index: usize) -> BoothResult<RgbaImage> {
        let chunk = self
            .data
            .chunks
            .get(index)
            .ok_or_else(|| BoothError::image(format!("clip chunk {index} out of range")))?;
        Ok(image::load_from_memory(&chunk.jpeg)?.to_rgba8())
    }
}

#[derive(Debug)]
struct ArmedClip {
    slot: usize,
    dimensions: (u32, u32),
    frame_interval_ms: u64,
    // absolute timestamps; rebased when the clip is finalized
    chunks: VecDeque<ClipChunk>,
}

/// Records one clip at a time
#[derive(Debug)]
pub struct ClipRecorder {
    clock: SharedClock,
    jpeg_quality: u8,
    max_chunks: usize,
    armed: Option<ArmedClip>,
}

impl ClipRecorder {
    /// Create a recorder
    #[must_use]
    pub fn new(clock: SharedClock, jpeg_quality: u8, max_chunks: usize) -> Self {
        Self {
            clock,
            jpeg_quality,
            max_chunks: max_chunks.max(1),
            armed: None,
        }
    }

    /// Slot currently being recorded
    #[must_use]
    pub fn armed_slot(&self) -> Option<usize> {
        self.armed.as_ref().map(|a| a.slot)
    }

    /// Whether a clip is being recorded
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Start recording for `slot` from `stream`
    ///
    /// # Errors
    ///
    /// Returns `ClipUnavailable` if the stream is not live
    pub fn arm(&mut self, slot: usize, stream: &dyn LiveStream) -> BoothResult<()> {
        if let Some(previous) = self.armed.take() {
            warn!(slot = previous.slot, "re-arming clip recorder, dropping unfinished clip");
        }
        if !stream.is_live() {
            return Err(BoothError::ClipUnavailable {
                slot,
                message: format!("stream on {} is not live", stream.device_id()),
            });
        }
        let frame_interval_ms = (stream.frame_interval().as_millis() as u64).max(1);
        self.armed = Some(ArmedClip {
            slot,
            dimensions: stream.dimensions(),
            frame_interval_ms,
            chunks: VecDeque::new(),
        });
        debug!(slot, "clip recorder armed");
        Ok(())
    }

    /// Append a frame; ignored when not armed. Returns whether it was kept.
    ///
    /// # Errors
    ///
    /// Returns error if the frame cannot be encoded
    pub fn record(&mut self, frame: &RgbaImage) -> BoothResult<bool> {
        let Some(armed) = self.armed.as_mut() else {
            return Ok(false);
        };
        let jpeg = encode_jpeg(frame, self.jpeg_quality)?;
        if armed.chunks.len() == self.max_chunks {
            armed.chunks.pop_front();
        }
        armed.chunks.push_back(ClipChunk {
            timestamp_ms: self.clock.now_ms(),
            jpeg,
        });
        armed.dimensions = frame.dimensions();
        Ok(true)
    }

    /// Finish the clip; `None` if nothing was armed or recorded
    pub fn stop(&mut self) -> Option<VideoClip> {
        let armed = self.armed.take()?;
        let base = armed.chunks.front()?.timestamp_ms;
        let now = self.clock.now_ms();
        let chunks: Vec<ClipChunk> = armed
            .chunks
            .into_iter()
            .map(|c| ClipChunk {
                timestamp_ms: c.timestamp_ms - base,
                jpeg: c.jpeg,
            })
            .collect();
        let last = chunks.last().map_or(0, |c| c.timestamp_ms);
        // The last chunk stays on screen for at least one frame interval
        let duration_ms = now.saturating_sub(base).max(last + armed.frame_interval_ms);

        match VideoClip::new(armed.slot, armed.dimensions, duration_ms, chunks) {
            Ok(clip) => {
                debug!(slot = armed.slot, duration_ms, "clip finalized");
                Some(clip)
            }
            Err(e) => {
                warn!(error = %e, "discarding clip");
                None
            }
        }
    }

    /// Drop any in-flight recording
    pub fn discard(&mut self) {
        if let Some(armed) = self.armed.take() {
            debug!(slot = armed.slot, chunks = armed.chunks.len(), "clip discarded");
        }
    }
}
