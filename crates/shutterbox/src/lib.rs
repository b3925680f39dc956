//! Shutterbox: photo-kiosk capture sessions and souvenir compositing
//!
//! A session takes six shots from a live capture device under operator and
//! timer control, then renders them into a PNG strip, a looping GIF and a
//! synchronized MP4 highlight video.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         SHUTTERBOX                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐  │
//! │  │ Capture      │   │ Shot session     │   │ Composite        │  │
//! │  │ device       │──►│ controller       │──►│ exporter         │  │
//! │  │ manager      │   │ (+ clip recorder)│   │ strip/loop/video │  │
//! │  └──────────────┘   └──────────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shutterbox::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> BoothResult<()> {
//! let config = BoothConfig::default();
//! let backend = Arc::new(SyntheticBackend::new().with_device("OBS Virtual Camera"));
//! let catalog = BackgroundCatalog::generated(&config.export.strip.layout, &[[255, 255, 255, 255]]);
//! let mut kiosk = Kiosk::new(config, backend, Arc::new(UsageLedger::new()), catalog);
//!
//! let (tx, controls) = tokio::sync::mpsc::channel(8);
//! tx.send(OperatorCommand::TriggerCapture.into()).await.ok();
//! let report = kiosk.run_session("guest-1", controls).await?;
//! for artifact in report.outputs.artifacts() {
//!     artifact.write_to(std::path::Path::new("out"))?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod clip;
pub mod clock;
pub mod config;
pub mod device;
pub mod entry;
pub mod events;
pub mod export;
pub mod kiosk;
mod result;
pub mod session;

pub use result::{BoothError, BoothResult};

/// Commonly used types
pub mod prelude {
    pub use super::catalog::{Background, BackgroundCatalog};
    pub use super::clip::{ClipChunk, ClipRecorder, VideoClip};
    pub use super::clock::{Clock, FakeClock, RuntimeClock, SharedClock, SystemClock};
    pub use super::config::{BoothConfig, CaptureConfig, ExportConfig, SessionConfig, StripConfig};
    pub use super::device::{
        CaptureBackend, CaptureDeviceManager, DeviceId, DeviceInfo, LiveStream, ResolutionHint,
        StreamGuard, SyntheticBackend,
    };
    pub use super::entry::{EntryDecision, EntryValidator, UsageClass, UsageLedger};
    pub use super::events::{EventSink, KioskEvent, Notice};
    pub use super::export::{
        Artifact, ArtifactKind, CompositeExporter, CompositeJob, CompositeOutputs,
        PipelineOutcome, SlotLayout, StripOrientation,
    };
    pub use super::kiosk::{Kiosk, SessionReport};
    pub use super::result::{BoothError, BoothResult};
    pub use super::session::{
        KeyBindings, OperatorCommand, Session, SessionControl, SessionId, ShotSessionController,
        SLOT_COUNT,
    };
}
