//! Async driver: feeds commands, timers and device state into a
//! [`ShotMachine`] and carries out its effects.

use super::command::SessionControl;
use super::machine::{Effect, Input, ShotMachine, ShotTiming, TimerToken};
use super::slot::{Session, Still};
use crate::clip::ClipRecorder;
use crate::clock::SharedClock;
use crate::config::BoothConfig;
use crate::device::{CaptureDeviceManager, ResolutionHint};
use crate::events::{EventSink, KioskEvent};
use crate::result::{BoothError, BoothResult};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Runs one session against a capture device
#[derive(Debug)]
pub struct ShotSessionController<'a> {
    machine: ShotMachine,
    devices: &'a mut CaptureDeviceManager,
    recorder: ClipRecorder,
    clock: SharedClock,
    hint: ResolutionHint,
    acquire_attempts: u32,
    retry_backoff: Duration,
    reacquire_interval: Duration,
    // failed attempts in the current acquisition round
    failed_attempts: u32,
    events: EventSink,
    timer: Option<(TimerToken, Instant)>,
    reacquire_at: Option<Instant>,
    next_frame: Option<Instant>,
}

impl<'a> ShotSessionController<'a> {
    /// Create a controller for `session`
    #[must_use]
    pub fn new(
        session: Session,
        devices: &'a mut CaptureDeviceManager,
        config: &BoothConfig,
        clock: SharedClock,
    ) -> Self {
        let recorder = ClipRecorder::new(
            clock.clone(),
            config.session.clip_jpeg_quality,
            config.session.max_clip_chunks,
        );
        Self {
            machine: ShotMachine::new(session, ShotTiming::from(&config.session)),
            devices,
            recorder,
            clock,
            hint: config.capture.resolution,
            acquire_attempts: config.capture.acquire_attempts.max(1),
            retry_backoff: config.capture.retry_backoff(),
            reacquire_interval: config.capture.reacquire_interval(),
            failed_attempts: 0,
            events: EventSink::disabled(),
            timer: None,
            reacquire_at: None,
            next_frame: None,
        }
    }

    /// Publish events to `events`
    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// The state machine
    #[must_use]
    pub fn machine(&self) -> &ShotMachine {
        &self.machine
    }

    /// Drive the session until all six slots are accepted
    ///
    /// Closing the control channel abandons the session like
    /// [`SessionControl::Abandon`]. Device acquisition runs one attempt per
    /// loop turn, so commands and timers are served between retries.
    ///
    /// # Errors
    ///
    /// Returns `SessionAbandoned` if the session was abandoned; its media is
    /// released before returning
    pub async fn run(mut self, mut controls: mpsc::Receiver<SessionControl>) -> BoothResult<Session> {
        let session_id = self.machine.session().id().to_string();
        info!(session = %session_id, "session started");
        self.events.emit(KioskEvent::SessionStarted { session_id });

        if let Some(input) = self.acquire_step().await {
            self.dispatch(input).await;
        }
        let effects = self.machine.start();
        self.settle(effects).await;

        while !self.machine.is_complete() {
            let timer_at = self.timer.map(|(_, at)| at);
            tokio::select! {
                biased;
                control = controls.recv() => match control {
                    Some(SessionControl::Operator(command)) => {
                        debug!(?command, "operator command");
                        self.dispatch(Input::Command(command)).await;
                    }
                    Some(SessionControl::Abandon) | None => return Err(self.abandon()),
                },
                () = wait_until(timer_at) => {
                    if let Some((token, _)) = self.timer.take() {
                        self.dispatch(Input::TimerElapsed(token)).await;
                    }
                }
                () = wait_until(self.reacquire_at) => {
                    self.reacquire_at = None;
                    if let Some(input) = self.acquire_step().await {
                        self.dispatch(input).await;
                    }
                }
                () = wait_until(self.next_frame) => self.pump_frame().await,
            }
        }

        Ok(self.finish())
    }

    async fn dispatch(&mut self, input: Input) {
        let effects = self.machine.handle(input);
        self.settle(effects).await;
    }

    /// Apply effects until the machine stops producing follow-up inputs
    async fn settle(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            if let Some(input) = self.apply(effect).await {
                queue.extend(self.machine.handle(input));
            }
        }
    }

    async fn apply(&mut self, effect: Effect) -> Option<Input> {
        match effect {
            Effect::ArmClip { slot } => Some(self.arm_clip(slot)),
            Effect::CaptureStill { slot } => Some(self.capture(slot).await),
            Effect::DiscardClip => {
                self.recorder.discard();
                self.next_frame = None;
                None
            }
            Effect::Schedule { token, after } => {
                self.timer = Some((token, Instant::now() + after));
                None
            }
            Effect::CancelTimer => {
                self.timer = None;
                None
            }
            Effect::ResumePreview => {
                if self.devices.has_live_stream() || self.reacquire_at.is_some() {
                    None
                } else {
                    self.acquire_step().await
                }
            }
            Effect::Notify(event) => {
                self.events.emit(event);
                None
            }
            Effect::Complete => {
                info!(session = %self.machine.session().id(), "all slots accepted");
                None
            }
        }
    }

    fn arm_clip(&mut self, slot: usize) -> Input {
        let armed = match self.devices.stream() {
            Some(stream) => match self.recorder.arm(slot, stream.as_stream()) {
                Ok(()) => true,
                Err(e) => {
                    warn!(slot, error = %e, "clip recording unavailable");
                    false
                }
            },
            None => false,
        };
        if armed {
            self.next_frame = Some(Instant::now());
        }
        Input::ArmCompleted { armed }
    }

    async fn capture(&mut self, slot: usize) -> Input {
        let frame = match self.devices.stream() {
            Some(stream) => stream.read_frame().await,
            None => Err(BoothError::DeviceLost {
                message: "no active stream".to_string(),
            }),
        };
        let image = match frame {
            Ok(image) => image,
            Err(e) => return self.device_failed(e),
        };

        // the clip ends on the captured frame
        if let Err(e) = self.recorder.record(&image) {
            warn!(slot, error = %e, "final clip frame dropped");
        }
        let clip = self.recorder.stop();
        self.next_frame = None;
        if clip.is_none() {
            warn!(slot, "slot continues without a clip");
        }
        info!(slot, has_clip = clip.is_some(), "still captured");
        Input::Captured {
            still: Still::new(image, self.clock.now_ms()),
            clip,
        }
    }

    async fn pump_frame(&mut self) {
        let Some(stream) = self.devices.stream() else {
            self.next_frame = None;
            return;
        };
        let interval = stream.frame_interval();
        match stream.read_frame().await {
            Ok(frame) => {
                if let Err(e) = self.recorder.record(&frame) {
                    warn!(error = %e, "clip frame dropped");
                }
                self.next_frame = self
                    .recorder
                    .is_armed()
                    .then(|| Instant::now() + interval);
            }
            Err(e) => {
                let input = self.device_failed(e);
                self.dispatch(input).await;
            }
        }
    }

    fn device_failed(&mut self, error: BoothError) -> Input {
        warn!(error = %error, "capture stream lost");
        self.devices.release();
        self.next_frame = None;
        self.events.emit(KioskEvent::DeviceLost {
            message: error.to_string(),
        });
        self.failed_attempts = 0;
        self.reacquire_at = Some(Instant::now());
        Input::DeviceLost
    }

    /// One acquisition attempt if no stream is live
    ///
    /// A failed attempt schedules the next one after the retry backoff; once
    /// the round's attempts are spent the device is reported unavailable and
    /// a new round starts after the reacquire interval.
    async fn acquire_step(&mut self) -> Option<Input> {
        if self.devices.has_live_stream() {
            return Some(Input::DeviceReady);
        }
        match self.devices.try_acquire(self.hint).await {
            Ok(stream) => {
                let device = stream.device_id().clone();
                self.failed_attempts = 0;
                self.reacquire_at = None;
                self.events.emit(KioskEvent::DeviceReady { device });
                Some(Input::DeviceReady)
            }
            Err(e) => {
                self.failed_attempts += 1;
                let attempts = self.failed_attempts;
                if attempts < self.acquire_attempts {
                    warn!(attempt = attempts, error = %e, "capture stream acquisition failed");
                    self.reacquire_at = Some(Instant::now() + self.retry_backoff);
                    return None;
                }
                warn!(
                    attempts,
                    retry_in_ms = self.reacquire_interval.as_millis() as u64,
                    "capture device unavailable"
                );
                self.events.emit(KioskEvent::DeviceUnavailable {
                    attempts,
                    message: e.to_string(),
                });
                self.failed_attempts = 0;
                self.reacquire_at = Some(Instant::now() + self.reacquire_interval);
                None
            }
        }
    }

    fn abandon(&mut self) -> BoothError {
        self.recorder.discard();
        self.timer = None;
        self.next_frame = None;
        self.devices.release();

        let session_id = self.machine.session().id().to_string();
        self.machine.session_mut().release_media();
        info!(session = %session_id, "session abandoned");
        self.events.emit(KioskEvent::SessionReset {
            session_id: session_id.clone(),
        });
        BoothError::SessionAbandoned { session_id }
    }

    fn finish(mut self) -> Session {
        self.recorder.discard();
        self.devices.release();
        let session = self.machine.into_session();
        info!(
            session = %session.id(),
            stills = session.still_count(),
            clips = session.clip_count(),
            "session complete"
        );
        session
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
