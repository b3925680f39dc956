//! Synchronized frame sampling across several clips.
//!
//! For output frame `f` every clip seeks to `t = f / fps` (clamped short of
//! its end) and all seeks complete before the frame is drawn.

use crate::clip::VideoClip;
use crate::result::{BoothError, BoothResult};
use async_trait::async_trait;
use futures::future::join_all;
use image::RgbaImage;

/// Smallest distance kept from a clip's end (one microsecond)
const MIN_SEEK_MARGIN: f64 = 1e-6;

/// A seekable clip whose current frame can be drawn
#[async_trait]
pub trait ClipSource: Send {
    /// Clip length in seconds
    fn duration_secs(&self) -> f64;

    /// Move to `t_secs` and load the frame shown there
    async fn seek(&mut self, t_secs: f64) -> BoothResult<()>;

    /// Frame loaded by the last seek
    fn current_frame(&self) -> Option<&RgbaImage>;
}

/// [`ClipSource`] over a recorded clip, decoding on the blocking pool
#[derive(Debug)]
pub struct DecodedClip {
    clip: VideoClip,
    position: Option<usize>,
    frame: Option<RgbaImage>,
}

impl DecodedClip {
    /// Wrap a clip; nothing is decoded until the first seek
    #[must_use]
    pub fn new(clip: VideoClip) -> Self {
        Self {
            clip,
            position: None,
            frame: None,
        }
    }
}

#[async_trait]
impl ClipSource for DecodedClip {
    fn duration_secs(&self) -> f64 {
        self.clip.duration_secs()
    }

    async fn seek(&mut self, t_secs: f64) -> BoothResult<()> {
        let index = self.clip.chunk_index_at(t_secs);
        if self.position == Some(index) {
            return Ok(());
        }
        let clip = self.clip.clone();
        let frame = tokio::task::spawn_blocking(move || clip.decode_chunk(index))
            .await
            .map_err(|e| BoothError::image(format!("clip decode task failed: {e}")))??;
        self.frame = Some(frame);
        self.position = Some(index);
        Ok(())
    }

    fn current_frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }
}

/// Output length: the shortest clip, capped at `max_secs`
#[must_use]
pub fn highlight_duration(durations: &[f64], max_secs: f64) -> Option<f64> {
    durations
        .iter()
        .copied()
        .reduce(f64::min)
        .map(|shortest| shortest.min(max_secs))
}

/// Frames needed to cover `duration_secs` at `fps`
#[must_use]
pub fn frame_count(duration_secs: f64, fps: u32) -> usize {
    // tolerance keeps 2.0 s * 30 fps at exactly 60
    let exact = duration_secs * f64::from(fps);
    (exact - 1e-9).ceil().max(0.0) as usize
}

/// Seek target for time `t`, kept short of the clip's end
///
/// The margin is `epsilon` but never more than half the clip, so the
/// result always lies in `[0, clip_secs)`.
#[must_use]
pub fn clamp_seek_time(t_secs: f64, clip_secs: f64, epsilon: f64) -> f64 {
    let margin = epsilon.min(clip_secs / 2.0).max(MIN_SEEK_MARGIN);
    t_secs.clamp(0.0, (clip_secs - margin).max(0.0))
}

/// Drives a set of clips frame by frame
#[derive(Debug)]
pub struct FrameSampler<S> {
    sources: Vec<(usize, S)>,
    fps: u32,
    duration_secs: f64,
    epsilon: f64,
}

impl<S: ClipSource> FrameSampler<S> {
    /// Build a sampler over `(slot, source)` pairs; `None` when there are no sources
    #[must_use]
    pub fn new(sources: Vec<(usize, S)>, fps: u32, max_secs: f64, epsilon: f64) -> Option<Self> {
        let durations: Vec<f64> = sources.iter().map(|(_, s)| s.duration_secs()).collect();
        let duration_secs = highlight_duration(&durations, max_secs)?;
        Some(Self {
            sources,
            fps: fps.max(1),
            duration_secs,
            epsilon,
        })
    }

    /// Output duration
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Output frame count
    #[must_use]
    pub fn frame_count(&self) -> usize {
        frame_count(self.duration_secs, self.fps)
    }

    /// Output time of frame `f`
    #[must_use]
    pub fn frame_time(&self, frame: usize) -> f64 {
        frame as f64 / f64::from(self.fps)
    }

    /// Seek every clip to frame `f` and wait for all of them
    ///
    /// # Errors
    ///
    /// Returns the first seek failure once every seek has settled
    pub async fn seek_frame(&mut self, frame: usize) -> BoothResult<()> {
        let t = self.frame_time(frame);
        let epsilon = self.epsilon;
        let seeks = self.sources.iter_mut().map(|(_, source)| {
            let target = clamp_seek_time(t, source.duration_secs(), epsilon);
            source.seek(target)
        });
        join_all(seeks).await.into_iter().collect()
    }

    /// `(slot, frame)` for every clip with a loaded frame
    pub fn frames(&self) -> impl Iterator<Item = (usize, &RgbaImage)> {
        self.sources
            .iter()
            .filter_map(|(slot, source)| source.current_frame().map(|f| (*slot, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records every requested timestamp; seeks take a variable time
    #[derive(Debug)]
    struct ScriptedClip {
        duration: f64,
        delay_ms: u64,
        requests: Arc<Mutex<Vec<f64>>>,
        frame: RgbaImage,
    }

    impl ScriptedClip {
        fn new(duration: f64, delay_ms: u64) -> (Self, Arc<Mutex<Vec<f64>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    duration,
                    delay_ms,
                    requests: Arc::clone(&requests),
                    frame: RgbaImage::new(1, 1),
                },
                requests,
            )
        }
    }

    #[async_trait]
    impl ClipSource for ScriptedClip {
        fn duration_secs(&self) -> f64 {
            self.duration
        }

        async fn seek(&mut self, t_secs: f64) -> BoothResult<()> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.requests.lock().unwrap().push(t_secs);
            Ok(())
        }

        fn current_frame(&self) -> Option<&RgbaImage> {
            Some(&self.frame)
        }
    }

    mod timing {
        use super::*;

        #[test]
        fn test_duration_is_shortest_clip_capped() {
            assert_eq!(highlight_duration(&[2.0, 3.5, 4.0], 3.0), Some(2.0));
            assert_eq!(highlight_duration(&[5.0, 4.0], 3.0), Some(3.0));
            assert_eq!(highlight_duration(&[], 3.0), None);
        }

        #[test]
        fn test_frame_count() {
            assert_eq!(frame_count(2.0, 30), 60);
            assert_eq!(frame_count(3.0, 30), 90);
            assert_eq!(frame_count(0.05, 30), 2);
            assert_eq!(frame_count(0.0, 30), 0);
        }

        #[test]
        fn test_clamp_seek_time() {
            assert_eq!(clamp_seek_time(0.5, 2.0, 0.1), 0.5);
            assert!((clamp_seek_time(2.5, 2.0, 0.1) - 1.9).abs() < 1e-12);
            // short clip: margin limited to half its length
            assert!((clamp_seek_time(1.0, 0.1, 0.1) - 0.05).abs() < 1e-12);
        }
    }

    mod barrier {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_six_clips_sixty_frames() {
            let durations = [2.0, 2.5, 3.0, 3.5, 4.0, 2.2];
            let mut logs = Vec::new();
            let sources = durations
                .iter()
                .enumerate()
                .map(|(slot, d)| {
                    let (clip, log) = ScriptedClip::new(*d, 5 * slot as u64);
                    logs.push(log);
                    (slot, clip)
                })
                .collect();
            let mut sampler = FrameSampler::new(sources, 30, 3.0, 0.1).unwrap();

            assert_eq!(sampler.duration_secs(), 2.0);
            assert_eq!(sampler.frame_count(), 60);
            for f in 0..sampler.frame_count() {
                sampler.seek_frame(f).await.unwrap();
                // every clip has answered frame f before we continue
                for log in &logs {
                    assert_eq!(log.lock().unwrap().len(), f + 1);
                }
            }
            for (log, d) in logs.iter().zip(durations) {
                assert!(log.lock().unwrap().iter().all(|t| *t < d));
            }
            assert_eq!(sampler.frames().count(), 6);
        }

        #[tokio::test]
        async fn test_no_sources() {
            let sampler: Option<FrameSampler<ScriptedClip>> =
                FrameSampler::new(Vec::new(), 30, 3.0, 0.1);
            assert!(sampler.is_none());
        }

        #[tokio::test]
        async fn test_decoded_clip_seeks() {
            use crate::clip::ClipChunk;
            use crate::export::encode_jpeg;

            let chunks = [10u8, 200]
                .iter()
                .enumerate()
                .map(|(i, shade)| ClipChunk {
                    timestamp_ms: i as u64 * 500,
                    jpeg: encode_jpeg(
                        &RgbaImage::from_pixel(8, 8, image::Rgba([*shade, *shade, *shade, 255])),
                        95,
                    )
                    .unwrap(),
                })
                .collect();
            let clip = VideoClip::new(0, (8, 8), 1_000, chunks).unwrap();
            let mut source = DecodedClip::new(clip);
            assert!(source.current_frame().is_none());

            source.seek(0.1).await.unwrap();
            assert!(source.current_frame().unwrap().get_pixel(4, 4).0[0] < 50);
            source.seek(0.7).await.unwrap();
            assert!(source.current_frame().unwrap().get_pixel(4, 4).0[0] > 150);
        }
    }

    proptest! {
        #[test]
        fn prop_seek_never_reaches_end(
            t in 0.0f64..10.0,
            clip in 0.001f64..10.0,
            epsilon in 0.0f64..1.0,
        ) {
            let target = clamp_seek_time(t, clip, epsilon);
            prop_assert!(target >= 0.0);
            prop_assert!(target < clip);
        }

        #[test]
        fn prop_frame_count_covers_duration(duration in 0.01f64..10.0, fps in 1u32..=60) {
            let n = frame_count(duration, fps);
            let covered = n as f64 / f64::from(fps);
            prop_assert!(covered + 1e-6 >= duration);
            prop_assert!((n.saturating_sub(1)) as f64 / f64::from(fps) < duration);
        }
    }
}
