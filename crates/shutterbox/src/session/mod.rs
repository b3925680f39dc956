//! Shot sessions: six slots filled under operator and timer control.
//!
//! [`ShotMachine`] is the pure transition function; [`ShotSessionController`]
//! drives it with a capture device, a clip recorder and Tokio timers.

mod command;
mod controller;
mod machine;
mod slot;

/// Shots per session
pub const SLOT_COUNT: usize = 6;

pub use command::{KeyBindings, OperatorCommand, SessionControl};
pub use controller::ShotSessionController;
pub use machine::{Effect, Input, ShotMachine, ShotPhase, ShotTiming, TimerKind, TimerToken};
pub use slot::{Session, SessionId, SessionStatus, Slot, Still};
