//! Events published to the navigation/UI layer.

use crate::device::DeviceId;
use crate::export::ArtifactKind;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

/// Transient operator-facing notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Accept or retake pressed before the slot has a still
    CaptureFirst {
        /// Slot index
        slot: usize,
    },
    /// Retake accepted; the still is cleared once the notice ends
    RetakeConfirm {
        /// Slot index
        slot: usize,
    },
    /// Retake already used; the slot is accepted once the notice ends
    RetakeExhausted {
        /// Slot index
        slot: usize,
    },
    /// Clip recording could not start; the slot continues still-only
    ClipUnavailable {
        /// Slot index
        slot: usize,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaptureFirst { .. } => f.write_str("Take the photo first"),
            Self::RetakeConfirm { slot } => write!(f, "Retaking photo {}", slot + 1),
            Self::RetakeExhausted { .. } => {
                f.write_str("Each photo can only be retaken once. Moving on")
            }
            Self::ClipUnavailable { slot } => {
                write!(f, "Photo {} will not have a video clip", slot + 1)
            }
        }
    }
}

/// Kiosk lifecycle and progress events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum KioskEvent {
    /// A validated token started a session
    SessionStarted {
        /// Session identifier
        session_id: String,
    },
    /// A live stream is available
    DeviceReady {
        /// Device streaming
        device: DeviceId,
    },
    /// Acquisition failed after every attempt
    DeviceUnavailable {
        /// Attempts made
        attempts: u32,
        /// Last failure
        message: String,
    },
    /// The active stream stopped delivering frames
    DeviceLost {
        /// Failure reported by the stream
        message: String,
    },
    /// A slot waits for the capture trigger
    SlotReady {
        /// Slot index
        slot: usize,
        /// Session progress in 0.0..=1.0
        progress: f64,
    },
    /// Countdown cue; `remaining == 0` is the capture instant
    CountdownCue {
        /// Slot index
        slot: usize,
        /// Seconds left
        remaining: u8,
    },
    /// Device loss interrupted the countdown
    CountdownAborted {
        /// Slot index
        slot: usize,
    },
    /// A still was captured
    StillCaptured {
        /// Slot index
        slot: usize,
        /// Whether a clip was recorded alongside
        has_clip: bool,
    },
    /// The slot was accepted
    SlotAccepted {
        /// Slot index
        slot: usize,
        /// Accepted by the auto-advance timer
        automatic: bool,
    },
    /// A transient notice to show the operator
    Notice(Notice),
    /// Six slots accepted
    SessionComplete {
        /// Session identifier
        session_id: String,
    },
    /// The session was abandoned and its media dropped
    SessionReset {
        /// Session identifier
        session_id: String,
    },
    /// Highlight video rendering progress
    HighlightProgress {
        /// Frames rendered
        frame: usize,
        /// Frames total
        total: usize,
    },
    /// An artifact was produced
    ArtifactReady {
        /// Artifact kind
        kind: ArtifactKind,
        /// Output file name
        filename: String,
        /// Size in bytes
        bytes: usize,
    },
    /// An artifact was skipped for lack of inputs
    ArtifactSkipped {
        /// Artifact kind
        kind: ArtifactKind,
        /// Reason
        reason: String,
    },
    /// An artifact pipeline failed
    ArtifactFailed {
        /// Artifact kind
        kind: ArtifactKind,
        /// Failure
        message: String,
    },
}

/// Fire-and-forget event publisher; a dropped receiver is not an error
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<KioskEvent>>,
}

impl EventSink {
    /// Create a sink and its receiving end
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<KioskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Publish an event
    pub fn emit(&self, event: KioskEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
