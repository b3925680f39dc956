//! One kiosk: entry check, shot session, export.

use crate::catalog::BackgroundCatalog;
use crate::clock::{RuntimeClock, SharedClock};
use crate::config::BoothConfig;
use crate::device::{CaptureBackend, CaptureDeviceManager};
use crate::entry::{EntryDecision, EntryValidator, UsageClass};
use crate::events::EventSink;
use crate::export::{CompositeExporter, CompositeJob, CompositeOutputs};
use crate::result::{BoothError, BoothResult};
use crate::session::{Session, SessionControl, SessionId, ShotSessionController};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What a finished session produced
#[derive(Debug)]
pub struct SessionReport {
    /// Session identifier
    pub session_id: SessionId,
    /// Usage class of the entry token
    pub usage: UsageClass,
    /// Slots with a still
    pub stills: usize,
    /// Slots with a clip
    pub clips: usize,
    /// Pipeline outcomes
    pub outputs: CompositeOutputs,
}

/// Runs sessions one at a time on a single capture device
#[derive(Debug)]
pub struct Kiosk {
    config: BoothConfig,
    validator: Arc<dyn EntryValidator>,
    devices: CaptureDeviceManager,
    exporter: CompositeExporter,
    clock: SharedClock,
    events: EventSink,
    background_index: usize,
}

impl Kiosk {
    /// Create a kiosk
    #[must_use]
    pub fn new(
        config: BoothConfig,
        backend: Arc<dyn CaptureBackend>,
        validator: Arc<dyn EntryValidator>,
        catalog: BackgroundCatalog,
    ) -> Self {
        let devices = CaptureDeviceManager::new(backend, config.capture.clone());
        let exporter = CompositeExporter::new(config.export.clone(), catalog);
        Self {
            config,
            validator,
            devices,
            exporter,
            clock: RuntimeClock::shared(),
            events: EventSink::disabled(),
            background_index: 0,
        }
    }

    /// Publish events from the controller and the exporter
    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.exporter = self.exporter.with_events(events.clone());
        self.events = events;
        self
    }

    /// Frames drawn over the highlight video, indexed like the backgrounds
    #[must_use]
    pub fn with_highlight_frames(mut self, frames: BackgroundCatalog) -> Self {
        self.exporter = self.exporter.with_highlight_frames(frames);
        self
    }

    /// Replace the exporter (custom encoder or loop overlay)
    #[must_use]
    pub fn with_exporter(mut self, exporter: CompositeExporter) -> Self {
        self.exporter = exporter.with_events(self.events.clone());
        self
    }

    /// Use a different clock for capture timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Capture devices
    pub fn devices(&mut self) -> &mut CaptureDeviceManager {
        &mut self.devices
    }

    /// Selected background
    #[must_use]
    pub const fn background_index(&self) -> usize {
        self.background_index
    }

    /// Select the next background, wrapping around
    pub fn next_background(&mut self) -> usize {
        self.background_index = self.exporter.catalog().next_index(self.background_index);
        self.background_index
    }

    /// Select the previous background, wrapping around
    pub fn prev_background(&mut self) -> usize {
        self.background_index = self.exporter.catalog().prev_index(self.background_index);
        self.background_index
    }

    /// Validate `token`, run a session fed by `controls`, and export it
    ///
    /// # Errors
    ///
    /// Returns `EntryRejected` for a refused token and `SessionAbandoned`
    /// when the session ends early. Export failures are reported per
    /// artifact in the returned outputs.
    pub async fn run_session(
        &mut self,
        token: &str,
        controls: mpsc::Receiver<SessionControl>,
    ) -> BoothResult<SessionReport> {
        let usage = match self.validator.validate(token).await {
            EntryDecision::Accepted { usage, .. } => usage,
            EntryDecision::Rejected { reason } => {
                warn!(token, %reason, "entry rejected");
                return Err(BoothError::EntryRejected {
                    token: token.to_string(),
                });
            }
        };

        let session_id = SessionId::new(token.trim());
        let session = ShotSessionController::new(
            Session::new(session_id),
            &mut self.devices,
            &self.config,
            self.clock.clone(),
        )
        .with_events(self.events.clone())
        .run(controls)
        .await?;

        let job = CompositeJob::from_session(&session, self.background_index);
        // the job holds its own snapshot; the session's media goes now
        drop(session);
        let outputs = self.exporter.export(&job).await;
        info!(
            session = %job.session_id(),
            artifacts = outputs.artifacts().len(),
            "session exported"
        );

        Ok(SessionReport {
            session_id: job.session_id().clone(),
            usage,
            stills: job.still_count(),
            clips: job.clip_count(),
            outputs,
        })
    }
}
