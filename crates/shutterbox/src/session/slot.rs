//! Session data: six ordered slots, each with a still and an optional clip.

use super::SLOT_COUNT;
use crate::clip::VideoClip;
use crate::export::sanitize_session_id;
use crate::result::{BoothError, BoothResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Session identifier, usually the entry token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random identifier for sessions without a token
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-name-safe form used for artifact names
    #[must_use]
    pub fn file_stem(&self) -> String {
        sanitize_session_id(&self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A captured still frame
#[derive(Debug, Clone, PartialEq)]
pub struct Still {
    image: Arc<RgbaImage>,
    captured_at_ms: u64,
}

impl Still {
    /// Wrap a captured frame
    #[must_use]
    pub fn new(image: RgbaImage, captured_at_ms: u64) -> Self {
        Self {
            image: Arc::new(image),
            captured_at_ms,
        }
    }

    /// Pixels
    #[must_use]
    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    /// Capture time from the session clock
    #[must_use]
    pub const fn captured_at_ms(&self) -> u64 {
        self.captured_at_ms
    }
}

/// One of the six shots
#[derive(Debug, Clone, Default)]
pub struct Slot {
    index: usize,
    still: Option<Still>,
    clip: Option<VideoClip>,
    retake_used: bool,
}

impl Slot {
    /// Empty slot at `index`
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Slot filled with a still (and optionally a clip)
    #[must_use]
    pub fn captured(index: usize, still: Still, clip: Option<VideoClip>) -> Self {
        Self {
            index,
            still: Some(still),
            clip,
            retake_used: false,
        }
    }

    /// Position in the session
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The still, once captured
    #[must_use]
    pub fn still(&self) -> Option<&Still> {
        self.still.as_ref()
    }

    /// The clip, if one was recorded
    #[must_use]
    pub fn clip(&self) -> Option<&VideoClip> {
        self.clip.as_ref()
    }

    /// Whether the single retake has been spent
    #[must_use]
    pub const fn retake_used(&self) -> bool {
        self.retake_used
    }

    /// Whether a still exists
    #[must_use]
    pub const fn has_still(&self) -> bool {
        self.still.is_some()
    }

    pub(crate) fn store(&mut self, still: Still, clip: Option<VideoClip>) {
        self.still = Some(still);
        self.clip = clip;
    }

    /// Clear the capture and spend the retake; returns `false` if it was already spent
    pub(crate) fn spend_retake(&mut self) -> bool {
        if self.retake_used {
            return false;
        }
        self.retake_used = true;
        self.still = None;
        self.clip = None;
        true
    }

    fn release_media(&mut self) {
        self.still = None;
        self.clip = None;
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Shots still being taken
    #[default]
    Active,
    /// All six slots accepted
    Complete,
}

/// Six ordered slots plus status
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    slots: [Slot; SLOT_COUNT],
    status: SessionStatus,
}

impl Session {
    /// Fresh session with six empty slots
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            slots: std::array::from_fn(Slot::new),
            status: SessionStatus::Active,
        }
    }

    /// Build a session from exactly six slots (re-indexed in order)
    ///
    /// # Errors
    ///
    /// Returns `SlotCount` for any other number of slots
    pub fn from_slots(id: SessionId, slots: Vec<Slot>) -> BoothResult<Self> {
        let actual = slots.len();
        let mut slots: [Slot; SLOT_COUNT] =
            slots.try_into().map_err(|_| BoothError::SlotCount {
                expected: SLOT_COUNT,
                actual,
            })?;
        for (index, slot) in slots.iter_mut().enumerate() {
            slot.index = index;
        }
        let status = if slots.iter().all(Slot::has_still) {
            SessionStatus::Complete
        } else {
            SessionStatus::Active
        };
        Ok(Self { id, slots, status })
    }

    /// Identifier
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// All six slots in order
    #[must_use]
    pub fn slots(&self) -> &[Slot; SLOT_COUNT] {
        &self.slots
    }

    /// Slot by index
    ///
    /// # Errors
    ///
    /// Returns `SlotOutOfRange` for an index past the last slot
    pub fn slot(&self, index: usize) -> BoothResult<&Slot> {
        self.slots
            .get(index)
            .ok_or(BoothError::SlotOutOfRange { index })
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> BoothResult<&mut Slot> {
        self.slots
            .get_mut(index)
            .ok_or(BoothError::SlotOutOfRange { index })
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether every slot was accepted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub(crate) fn mark_complete(&mut self) {
        self.status = SessionStatus::Complete;
    }

    /// Slots holding a still
    #[must_use]
    pub fn still_count(&self) -> usize {
        self.slots.iter().filter(|s| s.has_still()).count()
    }

    /// Slots holding a clip
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.slots.iter().filter(|s| s.clip.is_some()).count()
    }

    /// Progress with `current` as the active slot: half a step once it has a still
    #[must_use]
    pub fn progress(&self, current: usize) -> f64 {
        let current = current.min(SLOT_COUNT);
        let partial = match self.slots.get(current) {
            Some(slot) if slot.has_still() => 0.5,
            _ => 0.0,
        };
        ((current as f64 + partial) / SLOT_COUNT as f64).min(1.0)
    }

    /// Drop every still and clip
    pub fn release_media(&mut self) {
        for slot in &mut self.slots {
            slot.release_media();
        }
    }
}
