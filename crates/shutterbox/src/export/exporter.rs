//! The composite exporter: three independent pipelines over one job.

use super::animation::{encode_loop, generated_loop_frame, LoopAnimationConfig, LOOP_FRAME_COLOR};
use super::artifact::{Artifact, ArtifactKind};
use super::encoder::{EncoderSettings, FrameBuffer, Mp4MjpegEncoder, VideoEncoder};
use super::sampler::{DecodedClip, FrameSampler};
use super::strip::{encode_png, render_strip};
use super::surface::{FitMode, Surface};
use crate::catalog::{Background, BackgroundCatalog};
use crate::clip::VideoClip;
use crate::config::ExportConfig;
use crate::events::{EventSink, KioskEvent};
use crate::result::{BoothError, BoothResult};
use crate::session::{Session, SessionId, SLOT_COUNT};
use image::RgbaImage;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Inputs of one slot, frozen when the job is created
#[derive(Debug, Clone, Default)]
pub struct SlotSnapshot {
    /// Captured still
    pub still: Option<Arc<RgbaImage>>,
    /// Recorded clip
    pub clip: Option<VideoClip>,
}

/// Immutable export request for a finished session
#[derive(Debug, Clone)]
pub struct CompositeJob {
    session_id: SessionId,
    inputs: Arc<[SlotSnapshot; SLOT_COUNT]>,
    background_index: usize,
}

impl CompositeJob {
    /// Snapshot a session's slots
    #[must_use]
    pub fn from_session(session: &Session, background_index: usize) -> Self {
        let inputs = std::array::from_fn(|i| {
            let slot = &session.slots()[i];
            SlotSnapshot {
                still: slot.still().map(|s| Arc::clone(s.image())),
                clip: slot.clip().cloned(),
            }
        });
        Self::new(session.id().clone(), inputs, background_index)
    }

    /// Build a job from explicit inputs
    #[must_use]
    pub fn new(
        session_id: SessionId,
        inputs: [SlotSnapshot; SLOT_COUNT],
        background_index: usize,
    ) -> Self {
        Self {
            session_id,
            inputs: Arc::new(inputs),
            background_index,
        }
    }

    /// Session the job belongs to
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Slot inputs in order
    #[must_use]
    pub fn inputs(&self) -> &[SlotSnapshot; SLOT_COUNT] {
        &self.inputs
    }

    /// Selected background
    #[must_use]
    pub const fn background_index(&self) -> usize {
        self.background_index
    }

    /// Slots with a still
    #[must_use]
    pub fn still_count(&self) -> usize {
        self.inputs.iter().filter(|s| s.still.is_some()).count()
    }

    /// Slots with a clip
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.inputs.iter().filter(|s| s.clip.is_some()).count()
    }

    fn stills(&self) -> [Option<Arc<RgbaImage>>; SLOT_COUNT] {
        std::array::from_fn(|i| self.inputs[i].still.clone())
    }
}

/// Result of one pipeline
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Artifact encoded
    Produced(Artifact),
    /// Inputs insufficient; not an error
    Skipped(String),
    /// Pipeline failed; the other pipelines are unaffected
    Failed(BoothError),
}

impl PipelineOutcome {
    /// The artifact, if produced
    #[must_use]
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Produced(artifact) => Some(artifact),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }

    fn settle(result: BoothResult<Result<Artifact, String>>) -> Self {
        match result {
            Ok(Ok(artifact)) => Self::Produced(artifact),
            Ok(Err(reason)) => Self::Skipped(reason),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Outcomes of the three pipelines
#[derive(Debug)]
pub struct CompositeOutputs {
    /// Strip image
    pub strip: PipelineOutcome,
    /// Looping animation
    pub loop_animation: PipelineOutcome,
    /// Highlight video
    pub highlight_video: PipelineOutcome,
}

impl CompositeOutputs {
    /// Outcome for a kind
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> &PipelineOutcome {
        match kind {
            ArtifactKind::Strip => &self.strip,
            ArtifactKind::LoopAnimation => &self.loop_animation,
            ArtifactKind::HighlightVideo => &self.highlight_video,
        }
    }

    /// Produced artifacts in pipeline order
    #[must_use]
    pub fn artifacts(&self) -> Vec<&Artifact> {
        ArtifactKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind).artifact())
            .collect()
    }
}

/// Creates a fresh encoder per highlight job
pub type EncoderFactory = Arc<dyn Fn() -> Box<dyn VideoEncoder> + Send + Sync>;

/// Renders strips, loop animations and highlight videos
#[derive(Clone)]
pub struct CompositeExporter {
    config: ExportConfig,
    catalog: BackgroundCatalog,
    loop_overlay: Option<Arc<RgbaImage>>,
    highlight_frames: Option<BackgroundCatalog>,
    encoder_factory: EncoderFactory,
    events: EventSink,
}

impl fmt::Debug for CompositeExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeExporter")
            .field("config", &self.config)
            .field("backgrounds", &self.catalog.len())
            .field("loop_overlay", &self.loop_overlay.is_some())
            .field(
                "highlight_frames",
                &self.highlight_frames.as_ref().map(BackgroundCatalog::len),
            )
            .finish_non_exhaustive()
    }
}

impl CompositeExporter {
    /// Create an exporter writing MJPEG MP4 highlight videos
    #[must_use]
    pub fn new(config: ExportConfig, catalog: BackgroundCatalog) -> Self {
        Self {
            config,
            catalog,
            loop_overlay: None,
            highlight_frames: None,
            encoder_factory: Arc::new(|| -> Box<dyn VideoEncoder> {
                Box::new(Mp4MjpegEncoder::new())
            }),
            events: EventSink::disabled(),
        }
    }

    /// Overlay frame drawn over each loop animation frame, in place of
    /// `loop_frame` from the configuration
    #[must_use]
    pub fn with_loop_overlay(mut self, overlay: RgbaImage) -> Self {
        self.loop_overlay = Some(Arc::new(overlay));
        self
    }

    /// Frames for the highlight video, indexed like the strip backgrounds
    ///
    /// Without them the strip background is reused, but only when the strip
    /// is framed and its windows line up with the highlight layout.
    #[must_use]
    pub fn with_highlight_frames(mut self, frames: BackgroundCatalog) -> Self {
        self.highlight_frames = Some(frames);
        self
    }

    /// Use a different highlight video encoder
    #[must_use]
    pub fn with_encoder_factory(mut self, factory: EncoderFactory) -> Self {
        self.encoder_factory = factory;
        self
    }

    /// Publish progress and artifact events
    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Background catalog
    #[must_use]
    pub fn catalog(&self) -> &BackgroundCatalog {
        &self.catalog
    }

    /// Run all three pipelines; each settles on its own
    pub async fn export(&self, job: &CompositeJob) -> CompositeOutputs {
        info!(
            session = %job.session_id(),
            stills = job.still_count(),
            clips = job.clip_count(),
            background = job.background_index(),
            "exporting session"
        );

        let (strip, loop_animation, highlight_video) = tokio::join!(
            self.strip(job),
            self.loop_animation(job),
            self.highlight_video(job),
        );
        let outputs = CompositeOutputs {
            strip: PipelineOutcome::settle(strip),
            loop_animation: PipelineOutcome::settle(loop_animation),
            highlight_video: PipelineOutcome::settle(highlight_video),
        };

        for kind in ArtifactKind::ALL {
            self.report(kind, outputs.get(kind));
        }
        outputs
    }

    fn report(&self, kind: ArtifactKind, outcome: &PipelineOutcome) {
        let event = match outcome {
            PipelineOutcome::Produced(artifact) => {
                info!(%kind, file = artifact.filename(), bytes = artifact.bytes().len(), "artifact produced");
                KioskEvent::ArtifactReady {
                    kind,
                    filename: artifact.filename().to_string(),
                    bytes: artifact.bytes().len(),
                }
            }
            PipelineOutcome::Skipped(reason) => {
                info!(%kind, reason = %reason, "artifact skipped");
                KioskEvent::ArtifactSkipped {
                    kind,
                    reason: reason.clone(),
                }
            }
            PipelineOutcome::Failed(e) => {
                warn!(%kind, error = %e, "artifact pipeline failed");
                KioskEvent::ArtifactFailed {
                    kind,
                    message: e.to_string(),
                }
            }
        };
        self.events.emit(event);
    }

    fn background(&self, index: usize) -> Option<Arc<RgbaImage>> {
        pick(&self.catalog, index)
    }

    fn highlight_frame(&self, index: usize) -> Option<Arc<RgbaImage>> {
        if let Some(frames) = &self.highlight_frames {
            return pick(frames, index);
        }
        let strip = &self.config.strip;
        if strip.framed && strip.layout.aligns_with(&self.config.highlight_layout) {
            self.background(index)
        } else {
            debug!("strip background does not fit the highlight layout, no overlay");
            None
        }
    }

    async fn strip(&self, job: &CompositeJob) -> BoothResult<Result<Artifact, String>> {
        if job.still_count() == 0 {
            return Ok(Err("no stills captured".to_string()));
        }
        let stills = job.stills();
        let layout = self.config.strip.layout.clone();
        let background = if self.config.strip.framed {
            self.background(job.background_index())
        } else {
            None
        };
        let session_id = job.session_id().clone();

        tokio::task::spawn_blocking(move || -> BoothResult<Result<Artifact, String>> {
            let image = render_strip(&stills, &layout, background.as_deref())?;
            let bytes = encode_png(&image, session_id.as_str())?;
            Ok(Ok(Artifact::new(ArtifactKind::Strip, &session_id, bytes)))
        })
        .await
        .map_err(|e| BoothError::encode(ArtifactKind::Strip.label(), e.to_string()))?
    }

    async fn loop_animation(&self, job: &CompositeJob) -> BoothResult<Result<Artifact, String>> {
        let stills: Vec<Arc<RgbaImage>> = job
            .inputs()
            .iter()
            .filter_map(|s| s.still.clone())
            .collect();
        if stills.len() < SLOT_COUNT {
            return Ok(Err(format!(
                "needs all {SLOT_COUNT} stills, have {}",
                stills.len()
            )));
        }
        let config = LoopAnimationConfig {
            width: self.config.loop_width,
            height: self.config.loop_height,
            interval_ms: self.config.loop_interval_ms,
            quality: self.config.loop_quality,
        };
        let explicit = self.loop_overlay.clone();
        let frame_path = self.config.loop_frame.clone();
        let session_id = job.session_id().clone();

        tokio::task::spawn_blocking(move || -> BoothResult<Result<Artifact, String>> {
            let overlay = match (explicit, frame_path) {
                (Some(overlay), _) => overlay,
                (None, Some(path)) => Arc::new(load_loop_frame(&path)?),
                (None, None) => Arc::new(generated_loop_frame(
                    config.width,
                    config.height,
                    LOOP_FRAME_COLOR,
                )),
            };
            let bytes = encode_loop(&stills, Some(&*overlay), &config)?;
            Ok(Ok(Artifact::new(ArtifactKind::LoopAnimation, &session_id, bytes)))
        })
        .await
        .map_err(|e| BoothError::encode(ArtifactKind::LoopAnimation.label(), e.to_string()))?
    }

    async fn highlight_video(&self, job: &CompositeJob) -> BoothResult<Result<Artifact, String>> {
        let sources: Vec<(usize, DecodedClip)> = job
            .inputs()
            .iter()
            .enumerate()
            .filter_map(|(slot, s)| s.clip.clone().map(|c| (slot, DecodedClip::new(c))))
            .collect();
        let Some(mut sampler) = FrameSampler::new(
            sources,
            self.config.fps,
            self.config.max_highlight_secs,
            self.config.seek_epsilon_secs,
        ) else {
            return Ok(Err("no clips recorded".to_string()));
        };

        let layout = &self.config.highlight_layout;
        let mut encoder = (self.encoder_factory)();
        encoder.load(EncoderSettings {
            width: layout.width,
            height: layout.height,
            fps: self.config.fps,
        })?;

        // Slots without a clip show their still in every frame
        let mut base = Surface::new(layout.width, layout.height);
        for (slot, input) in job.inputs().iter().enumerate() {
            if let (None, Some(still)) = (&input.clip, &input.still) {
                base.draw(still, layout.slot(slot)?, FitMode::Cover)?;
            }
        }
        let overlay = self.highlight_frame(job.background_index());

        let total = sampler.frame_count();
        info!(
            duration_secs = sampler.duration_secs(),
            frames = total,
            "rendering highlight video"
        );
        let mut buffers = Vec::with_capacity(total);
        for index in 0..total {
            sampler.seek_frame(index).await?;
            let mut surface = base.clone();
            for (slot, frame) in sampler.frames() {
                surface.draw(frame, layout.slot(slot)?, FitMode::Stretch)?;
            }
            if let Some(frame) = overlay.as_deref() {
                surface.overlay(frame);
            }
            buffers.push(FrameBuffer {
                index,
                jpeg: surface.encode_jpeg(self.config.frame_jpeg_quality)?,
            });
            self.events.emit(KioskEvent::HighlightProgress {
                frame: index + 1,
                total,
            });
        }

        for buffer in buffers {
            encoder.submit_frame(buffer)?;
        }
        let bytes = tokio::task::spawn_blocking(move || encoder.finalize())
            .await
            .map_err(|e| BoothError::encode(ArtifactKind::HighlightVideo.label(), e.to_string()))??;
        Ok(Ok(Artifact::new(
            ArtifactKind::HighlightVideo,
            job.session_id(),
            bytes,
        )))
    }
}

fn pick(catalog: &BackgroundCatalog, index: usize) -> Option<Arc<RgbaImage>> {
    let background = catalog.get(index);
    if background.is_none() && !catalog.is_empty() {
        warn!(index, available = catalog.len(), "background index out of range");
    }
    background.map(Background::shared_image)
}

fn load_loop_frame(path: &Path) -> BoothResult<RgbaImage> {
    debug!(path = %path.display(), "loading loop frame");
    image::open(path)
        .map(|frame| frame.to_rgba8())
        .map_err(|e| {
            BoothError::encode(
                ArtifactKind::LoopAnimation.label(),
                format!("loop frame {}: {e}", path.display()),
            )
        })
}
