//! The per-slot shot state machine.
//!
//! `ShotMachine` is synchronous and owns no I/O: every input returns the
//! effects the driver must carry out (arm the recorder, read a still,
//! schedule a timer, publish an event). Timers are identified by a
//! [`TimerToken`] whose generation changes on every schedule, so a timer
//! that fires after it was replaced or cancelled is ignored.
//!
//! ```text
//! Idle ─trigger─► Armed ─armed─► Countdown(5..1) ─tick─► Capturing ─still─► Captured
//!  ▲                                                                          │
//!  └────────── RetakeConfirm ◄─retake(unused)──────────────────────────────────┤
//!                                  RetakeDenied ◄─retake(used)─────────────────┤
//!                                       │                                      │
//!                                       └──────────► accept / auto-advance ◄───┘
//!                                                        │
//!                                            Idle(i+1) or Complete
//! ```

use super::command::OperatorCommand;
use super::slot::{Session, Still};
use super::SLOT_COUNT;
use crate::clip::VideoClip;
use crate::config::SessionConfig;
use crate::events::{KioskEvent, Notice};
use std::time::Duration;
use tracing::debug;

/// Where the current slot is in its capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotPhase {
    /// Waiting for the capture trigger
    Idle,
    /// Clip recorder being armed
    Armed,
    /// Counting down to the capture
    Countdown {
        /// Cues left before the capture
        remaining: u8,
    },
    /// Reading the still
    Capturing,
    /// Still stored; waiting for accept, retake or auto-advance
    Captured,
    /// Retake notice showing; the slot is cleared when it ends
    RetakeConfirm,
    /// Retake-exhausted notice showing; the slot is accepted when it ends
    RetakeDenied,
    /// All slots accepted
    Complete,
}

/// Purpose of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One countdown second
    CountdownTick,
    /// Idle acceptance of a captured slot
    AutoAdvance,
    /// End of the retake notice
    RetakeConfirm,
    /// End of the retake-exhausted notice
    RetakeDenied,
}

/// Handle of one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    /// What the timer is for
    pub kind: TimerKind,
    /// Schedule generation; only the latest generation is honoured
    pub generation: u64,
}

/// Durations used by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotTiming {
    /// Countdown start value
    pub countdown_from: u8,
    /// Countdown tick
    pub tick: Duration,
    /// Auto-advance delay in `Captured`
    pub auto_advance: Duration,
    /// Retake notice length
    pub retake_confirm: Duration,
    /// Retake-exhausted notice length
    pub retake_exhausted: Duration,
}

impl From<&SessionConfig> for ShotTiming {
    fn from(config: &SessionConfig) -> Self {
        Self {
            countdown_from: config.countdown_from.max(1),
            tick: Duration::from_millis(config.tick_ms),
            auto_advance: Duration::from_millis(config.auto_advance_ms),
            retake_confirm: Duration::from_millis(config.retake_confirm_ms),
            retake_exhausted: Duration::from_millis(config.retake_exhausted_ms),
        }
    }
}

impl Default for ShotTiming {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

/// Inputs to the machine
#[derive(Debug, Clone)]
pub enum Input {
    /// Operator command from any input channel
    Command(OperatorCommand),
    /// A live stream became available
    DeviceReady,
    /// The live stream was lost
    DeviceLost,
    /// Arming finished; `armed` is false when no clip will be recorded
    ArmCompleted {
        /// Whether the recorder is running
        armed: bool,
    },
    /// The still was read and the recorder stopped
    Captured {
        /// Captured frame
        still: Still,
        /// Clip bracketing the capture
        clip: Option<VideoClip>,
    },
    /// A scheduled timer fired
    TimerElapsed(TimerToken),
}

/// Work the driver performs on behalf of the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start recording a clip for the slot
    ArmClip {
        /// Slot index
        slot: usize,
    },
    /// Read a still and stop the clip recorder in the same step
    CaptureStill {
        /// Slot index
        slot: usize,
    },
    /// Drop the in-flight clip
    DiscardClip,
    /// Schedule a timer, replacing any pending one
    Schedule {
        /// Token delivered when the timer fires
        token: TimerToken,
        /// Delay
        after: Duration,
    },
    /// Drop the pending timer
    CancelTimer,
    /// Make sure the preview stream is live again
    ResumePreview,
    /// Publish an event
    Notify(KioskEvent),
    /// Session finished; hand the slots to the exporter
    Complete,
}

/// Exhaustive transition function over one session
#[derive(Debug)]
pub struct ShotMachine {
    session: Session,
    current: usize,
    phase: ShotPhase,
    device_ready: bool,
    timer: Option<TimerToken>,
    next_generation: u64,
    timing: ShotTiming,
}

impl ShotMachine {
    /// Machine at slot 0 of `session`
    #[must_use]
    pub fn new(session: Session, timing: ShotTiming) -> Self {
        Self {
            session,
            current: 0,
            phase: ShotPhase::Idle,
            device_ready: false,
            timer: None,
            next_generation: 0,
            timing,
        }
    }

    /// The session being filled
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Give the session back
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Index of the slot being shot
    #[must_use]
    pub const fn current_slot(&self) -> usize {
        self.current
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> ShotPhase {
        self.phase
    }

    /// Whether a live stream is known to be available
    #[must_use]
    pub const fn device_ready(&self) -> bool {
        self.device_ready
    }

    /// Timer the machine is waiting for
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerToken> {
        self.timer
    }

    /// Whether every slot was accepted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == ShotPhase::Complete
    }

    /// Effects for entering the first slot
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.slot_ready()]
    }

    /// Apply one input
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let before = self.phase;
        let effects = match input {
            Input::Command(command) => self.on_command(command),
            Input::DeviceReady => {
                self.device_ready = true;
                Vec::new()
            }
            Input::DeviceLost => self.on_device_lost(),
            Input::ArmCompleted { armed } => self.on_armed(armed),
            Input::Captured { still, clip } => self.on_captured(still, clip),
            Input::TimerElapsed(token) => self.on_timer(token),
        };
        if before != self.phase {
            debug!(slot = self.current, from = ?before, to = ?self.phase, "shot transition");
        }
        effects
    }

    fn on_command(&mut self, command: OperatorCommand) -> Vec<Effect> {
        let slot = self.current;
        match (self.phase, command) {
            (ShotPhase::Idle, OperatorCommand::TriggerCapture) => {
                if !self.device_ready {
                    debug!(slot, "trigger ignored, no live device");
                    return Vec::new();
                }
                if self.session.slots()[slot].has_still() {
                    return Vec::new();
                }
                self.phase = ShotPhase::Armed;
                vec![Effect::ArmClip { slot }]
            }
            (
                ShotPhase::Idle | ShotPhase::Armed | ShotPhase::Countdown { .. } | ShotPhase::Capturing,
                OperatorCommand::Accept | OperatorCommand::Retake,
            ) => vec![notice(Notice::CaptureFirst { slot })],
            (ShotPhase::Captured, OperatorCommand::Accept)
            | (ShotPhase::RetakeDenied, OperatorCommand::Accept) => self.advance(false),
            (ShotPhase::Captured, OperatorCommand::Retake) => {
                if self.session.slots()[slot].retake_used() {
                    self.phase = ShotPhase::RetakeDenied;
                    vec![
                        notice(Notice::RetakeExhausted { slot }),
                        self.schedule(TimerKind::RetakeDenied, self.timing.retake_exhausted),
                    ]
                } else {
                    self.phase = ShotPhase::RetakeConfirm;
                    vec![
                        notice(Notice::RetakeConfirm { slot }),
                        self.schedule(TimerKind::RetakeConfirm, self.timing.retake_confirm),
                    ]
                }
            }
            (phase, command) => {
                debug!(slot, ?phase, ?command, "command ignored");
                Vec::new()
            }
        }
    }

    fn on_device_lost(&mut self) -> Vec<Effect> {
        self.device_ready = false;
        match self.phase {
            ShotPhase::Armed | ShotPhase::Countdown { .. } | ShotPhase::Capturing => {
                self.phase = ShotPhase::Idle;
                vec![
                    self.cancel_timer(),
                    Effect::DiscardClip,
                    Effect::Notify(KioskEvent::CountdownAborted { slot: self.current }),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn on_armed(&mut self, armed: bool) -> Vec<Effect> {
        if self.phase != ShotPhase::Armed {
            return Vec::new();
        }
        let slot = self.current;
        let remaining = self.timing.countdown_from;
        self.phase = ShotPhase::Countdown { remaining };

        let mut effects = Vec::with_capacity(3);
        if !armed {
            effects.push(notice(Notice::ClipUnavailable { slot }));
        }
        effects.push(Effect::Notify(KioskEvent::CountdownCue { slot, remaining }));
        effects.push(self.schedule(TimerKind::CountdownTick, self.timing.tick));
        effects
    }

    fn on_captured(&mut self, still: Still, clip: Option<VideoClip>) -> Vec<Effect> {
        if self.phase != ShotPhase::Capturing {
            debug!(slot = self.current, "late capture dropped");
            return Vec::new();
        }
        let slot = self.current;
        let has_clip = clip.is_some();
        match self.session.slot_mut(slot) {
            Ok(target) => target.store(still, clip),
            Err(_) => return Vec::new(),
        }
        self.phase = ShotPhase::Captured;
        vec![
            Effect::Notify(KioskEvent::StillCaptured { slot, has_clip }),
            self.schedule(TimerKind::AutoAdvance, self.timing.auto_advance),
        ]
    }

    fn on_timer(&mut self, token: TimerToken) -> Vec<Effect> {
        if self.timer != Some(token) {
            debug!(?token, "stale timer ignored");
            return Vec::new();
        }
        self.timer = None;
        let slot = self.current;

        match (token.kind, self.phase) {
            (TimerKind::CountdownTick, ShotPhase::Countdown { remaining }) => {
                let remaining = remaining.saturating_sub(1);
                let cue = Effect::Notify(KioskEvent::CountdownCue { slot, remaining });
                if remaining == 0 {
                    self.phase = ShotPhase::Capturing;
                    vec![cue, Effect::CaptureStill { slot }]
                } else {
                    self.phase = ShotPhase::Countdown { remaining };
                    vec![cue, self.schedule(TimerKind::CountdownTick, self.timing.tick)]
                }
            }
            (TimerKind::AutoAdvance, ShotPhase::Captured)
            | (TimerKind::RetakeDenied, ShotPhase::RetakeDenied) => self.advance(true),
            (TimerKind::RetakeConfirm, ShotPhase::RetakeConfirm) => {
                if let Ok(target) = self.session.slot_mut(slot) {
                    target.spend_retake();
                }
                self.phase = ShotPhase::Idle;
                vec![Effect::ResumePreview, self.slot_ready()]
            }
            (kind, phase) => {
                debug!(?kind, ?phase, "timer does not apply to phase");
                Vec::new()
            }
        }
    }

    fn advance(&mut self, automatic: bool) -> Vec<Effect> {
        let slot = self.current;
        if !self.session.slots()[slot].has_still() {
            return vec![notice(Notice::CaptureFirst { slot })];
        }

        let mut effects = vec![
            self.cancel_timer(),
            Effect::Notify(KioskEvent::SlotAccepted { slot, automatic }),
        ];
        if slot + 1 == SLOT_COUNT {
            self.phase = ShotPhase::Complete;
            self.session.mark_complete();
            effects.push(Effect::Notify(KioskEvent::SessionComplete {
                session_id: self.session.id().to_string(),
            }));
            effects.push(Effect::Complete);
        } else {
            self.current = slot + 1;
            self.phase = ShotPhase::Idle;
            effects.push(self.slot_ready());
        }
        effects
    }

    fn schedule(&mut self, kind: TimerKind, after: Duration) -> Effect {
        let token = TimerToken {
            kind,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.timer = Some(token);
        Effect::Schedule { token, after }
    }

    fn cancel_timer(&mut self) -> Effect {
        self.timer = None;
        Effect::CancelTimer
    }

    fn slot_ready(&self) -> Effect {
        Effect::Notify(KioskEvent::SlotReady {
            slot: self.current,
            progress: self.session.progress(self.current),
        })
    }
}

fn notice(notice: Notice) -> Effect {
    Effect::Notify(KioskEvent::Notice(notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use image::RgbaImage;
    use proptest::prelude::*;

    fn machine() -> ShotMachine {
        let mut machine = ShotMachine::new(Session::new(SessionId::new("t")), ShotTiming::default());
        machine.handle(Input::DeviceReady);
        machine
    }

    fn still() -> Still {
        Still::new(RgbaImage::new(4, 3), 0)
    }

    fn fire(machine: &mut ShotMachine) -> Vec<Effect> {
        let token = machine.pending_timer().unwrap();
        machine.handle(Input::TimerElapsed(token))
    }

    /// Trigger, count down, and capture the current slot
    fn shoot(machine: &mut ShotMachine) {
        machine.handle(Input::Command(OperatorCommand::TriggerCapture));
        machine.handle(Input::ArmCompleted { armed: true });
        while matches!(machine.phase(), ShotPhase::Countdown { .. }) {
            fire(machine);
        }
        machine.handle(Input::Captured {
            still: still(),
            clip: None,
        });
        assert_eq!(machine.phase(), ShotPhase::Captured);
    }

    fn cues(effects: &[Effect]) -> Vec<u8> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(KioskEvent::CountdownCue { remaining, .. }) => Some(*remaining),
                _ => None,
            })
            .collect()
    }

    mod countdown {
        use super::*;

        #[test]
        fn test_trigger_requires_device() {
            let mut machine =
                ShotMachine::new(Session::new(SessionId::new("t")), ShotTiming::default());
            let effects = machine.handle(Input::Command(OperatorCommand::TriggerCapture));
            assert!(effects.is_empty());
            assert_eq!(machine.phase(), ShotPhase::Idle);
        }

        #[test]
        fn test_counts_down_to_zero_before_capture() {
            let mut machine = machine();
            assert_eq!(
                machine.handle(Input::Command(OperatorCommand::TriggerCapture)),
                vec![Effect::ArmClip { slot: 0 }]
            );
            let mut seen = cues(&machine.handle(Input::ArmCompleted { armed: true }));
            assert_eq!(machine.phase(), ShotPhase::Countdown { remaining: 5 });

            let mut captures = 0;
            for _ in 0..5 {
                let effects = fire(&mut machine);
                seen.extend(cues(&effects));
                captures += effects
                    .iter()
                    .filter(|e| matches!(e, Effect::CaptureStill { .. }))
                    .count();
                if captures == 0 {
                    assert!(matches!(machine.phase(), ShotPhase::Countdown { .. }));
                }
            }
            assert_eq!(seen, [5, 4, 3, 2, 1, 0]);
            assert_eq!(captures, 1);
            assert_eq!(machine.phase(), ShotPhase::Capturing);
            assert!(machine.pending_timer().is_none());
        }

        #[test]
        fn test_ticks_are_one_second() {
            let mut machine = machine();
            machine.handle(Input::Command(OperatorCommand::TriggerCapture));
            let effects = machine.handle(Input::ArmCompleted { armed: true });
            assert!(effects.iter().any(|e| matches!(
                e,
                Effect::Schedule { token, after }
                    if token.kind == TimerKind::CountdownTick && *after == Duration::from_secs(1)
            )));
        }

        #[test]
        fn test_unarmed_clip_warns_and_continues() {
            let mut machine = machine();
            machine.handle(Input::Command(OperatorCommand::TriggerCapture));
            let effects = machine.handle(Input::ArmCompleted { armed: false });
            assert!(effects.contains(&notice(Notice::ClipUnavailable { slot: 0 })));
            assert!(matches!(machine.phase(), ShotPhase::Countdown { .. }));
        }

        #[test]
        fn test_device_loss_aborts_countdown() {
            let mut machine = machine();
            machine.handle(Input::Command(OperatorCommand::TriggerCapture));
            machine.handle(Input::ArmCompleted { armed: true });
            let stale = machine.pending_timer().unwrap();

            let effects = machine.handle(Input::DeviceLost);
            assert!(effects.contains(&Effect::DiscardClip));
            assert_eq!(machine.phase(), ShotPhase::Idle);
            assert!(!machine.device_ready());
            assert!(machine.handle(Input::TimerElapsed(stale)).is_empty());

            // a capture landing after the abort is dropped
            machine.handle(Input::Captured {
                still: still(),
                clip: None,
            });
            assert!(!machine.session().slots()[0].has_still());
        }
    }

    mod accept {
        use super::*;

        #[test]
        fn test_accept_without_still_is_a_notice() {
            let mut machine = machine();
            let effects = machine.handle(Input::Command(OperatorCommand::Accept));
            assert_eq!(effects, vec![notice(Notice::CaptureFirst { slot: 0 })]);
            assert_eq!(machine.phase(), ShotPhase::Idle);
            assert_eq!(machine.current_slot(), 0);
        }

        #[test]
        fn test_auto_advance_fires_once() {
            let mut machine = machine();
            shoot(&mut machine);
            let token = machine.pending_timer().unwrap();
            assert_eq!(token.kind, TimerKind::AutoAdvance);

            let effects = machine.handle(Input::TimerElapsed(token));
            assert!(effects.contains(&Effect::Notify(KioskEvent::SlotAccepted {
                slot: 0,
                automatic: true
            })));
            assert_eq!(machine.current_slot(), 1);
            assert!(machine.handle(Input::TimerElapsed(token)).is_empty());
            assert_eq!(machine.current_slot(), 1);
        }

        #[test]
        fn test_operator_accept_cancels_auto_advance() {
            let mut machine = machine();
            shoot(&mut machine);
            let token = machine.pending_timer().unwrap();
            let effects = machine.handle(Input::Command(OperatorCommand::Accept));
            assert!(effects.contains(&Effect::CancelTimer));
            assert!(machine.handle(Input::TimerElapsed(token)).is_empty());
            assert_eq!(machine.current_slot(), 1);
        }

        #[test]
        fn test_six_slots_complete_session() {
            let mut machine = machine();
            for slot in 0..SLOT_COUNT {
                assert_eq!(machine.current_slot(), slot);
                shoot(&mut machine);
                let effects = machine.handle(Input::Command(OperatorCommand::Accept));
                if slot + 1 == SLOT_COUNT {
                    assert!(effects.contains(&Effect::Complete));
                }
            }
            assert!(machine.is_complete());
            assert!(machine.session().is_complete());
            assert_eq!(machine.session().still_count(), SLOT_COUNT);
            assert!(machine
                .handle(Input::Command(OperatorCommand::TriggerCapture))
                .is_empty());
        }
    }

    mod retake {
        use super::*;

        #[test]
        fn test_retake_clears_slot_after_notice() {
            let mut machine = machine();
            shoot(&mut machine);
            machine.handle(Input::Command(OperatorCommand::Retake));
            assert_eq!(machine.phase(), ShotPhase::RetakeConfirm);
            // the still stays until the notice ends
            assert!(machine.session().slots()[0].has_still());
            assert_eq!(machine.pending_timer().unwrap().kind, TimerKind::RetakeConfirm);

            let effects = fire(&mut machine);
            assert!(effects.contains(&Effect::ResumePreview));
            assert_eq!(machine.phase(), ShotPhase::Idle);
            assert_eq!(machine.current_slot(), 0);
            let slot = &machine.session().slots()[0];
            assert!(!slot.has_still());
            assert!(slot.retake_used());
        }

        #[test]
        fn test_second_retake_is_forced_accept() {
            let mut machine = machine();
            shoot(&mut machine);
            machine.handle(Input::Command(OperatorCommand::Retake));
            fire(&mut machine);
            shoot(&mut machine);

            let effects = machine.handle(Input::Command(OperatorCommand::Retake));
            assert!(effects.contains(&notice(Notice::RetakeExhausted { slot: 0 })));
            assert_eq!(machine.phase(), ShotPhase::RetakeDenied);
            assert!(machine.session().slots()[0].has_still());

            fire(&mut machine);
            assert_eq!(machine.current_slot(), 1);
            assert_eq!(machine.phase(), ShotPhase::Idle);
        }

        #[test]
        fn test_commands_ignored_during_retake_notice() {
            let mut machine = machine();
            shoot(&mut machine);
            machine.handle(Input::Command(OperatorCommand::Retake));
            assert!(machine
                .handle(Input::Command(OperatorCommand::Accept))
                .is_empty());
            assert_eq!(machine.phase(), ShotPhase::RetakeConfirm);
        }

        #[test]
        fn test_accept_cuts_denied_notice_short() {
            let mut machine = machine();
            shoot(&mut machine);
            machine.handle(Input::Command(OperatorCommand::Retake));
            fire(&mut machine);
            shoot(&mut machine);
            machine.handle(Input::Command(OperatorCommand::Retake));
            let stale = machine.pending_timer().unwrap();

            machine.handle(Input::Command(OperatorCommand::Accept));
            assert_eq!(machine.current_slot(), 1);
            assert!(machine.handle(Input::TimerElapsed(stale)).is_empty());
            assert_eq!(machine.current_slot(), 1);
        }
    }

    #[derive(Debug, Clone)]
    enum Step {
        Trigger,
        Retake,
        Accept,
        Armed(bool),
        Capture,
        Fire,
        Stale,
        Lost,
        Ready,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Trigger),
            Just(Step::Retake),
            Just(Step::Accept),
            any::<bool>().prop_map(Step::Armed),
            Just(Step::Capture),
            Just(Step::Fire),
            Just(Step::Stale),
            Just(Step::Lost),
            Just(Step::Ready),
        ]
    }

    fn apply(machine: &mut ShotMachine, step: &Step) {
        let input = match step {
            Step::Trigger => Input::Command(OperatorCommand::TriggerCapture),
            Step::Retake => Input::Command(OperatorCommand::Retake),
            Step::Accept => Input::Command(OperatorCommand::Accept),
            Step::Armed(armed) => Input::ArmCompleted { armed: *armed },
            Step::Capture => Input::Captured {
                still: still(),
                clip: None,
            },
            Step::Fire => match machine.pending_timer() {
                Some(token) => Input::TimerElapsed(token),
                None => return,
            },
            Step::Stale => Input::TimerElapsed(TimerToken {
                kind: TimerKind::AutoAdvance,
                generation: u64::MAX,
            }),
            Step::Lost => Input::DeviceLost,
            Step::Ready => Input::DeviceReady,
        };
        machine.handle(input);
    }

    proptest! {
        #[test]
        fn prop_retake_flag_flips_at_most_once(steps in prop::collection::vec(step(), 0..200)) {
            let mut machine = machine();
            let mut flipped = [false; SLOT_COUNT];
            for step in &steps {
                apply(&mut machine, step);
                prop_assert_eq!(machine.session().slots().len(), SLOT_COUNT);
                for (i, slot) in machine.session().slots().iter().enumerate() {
                    prop_assert!(!(flipped[i] && !slot.retake_used()));
                    flipped[i] |= slot.retake_used();
                }
            }
        }

        #[test]
        fn prop_accept_without_still_changes_nothing(steps in prop::collection::vec(step(), 0..120)) {
            let mut machine = machine();
            for step in &steps {
                apply(&mut machine, step);
                let slot = machine.current_slot();
                if machine.is_complete() || machine.session().slots()[slot].has_still() {
                    continue;
                }
                let phase = machine.phase();
                let timer = machine.pending_timer();
                machine.handle(Input::Command(OperatorCommand::Accept));
                prop_assert_eq!(machine.phase(), phase);
                prop_assert_eq!(machine.current_slot(), slot);
                prop_assert_eq!(machine.pending_timer(), timer);
            }
        }

        #[test]
        fn prop_advancing_requires_a_still(steps in prop::collection::vec(step(), 0..200)) {
            let mut machine = machine();
            for step in &steps {
                apply(&mut machine, step);
                let current = machine.current_slot();
                for slot in &machine.session().slots()[..current] {
                    prop_assert!(slot.has_still());
                }
            }
        }
    }
}
