//! Frame orchestration
//!
//! `Session` owns the simulation, the transport and the recording and routes
//! events between them: a start event starts the transport and capture, an end
//! event stops the transport and hands the capture off for finalization.
//! Finalization runs outside the frame (async on the web), so the capture is
//! parked here until the host takes it.

use crate::consts::{STEPS, ZONE_COUNT};
use crate::platform::input::InputEvent;
use crate::recording::{AudioArtifact, Capture, RecordingError, RecordingSession, RecordingStatus};
use crate::sequencer::{Scheduler, Transport, Trigger, ZonePattern};
use crate::sim::{GameEvent, GamePhase, GameState, TickInput, Viewport, tick, world};
use crate::tuning::Tuning;

/// What one frame produced
#[derive(Debug, Default)]
pub struct FrameOutput {
    /// Notes to sound now
    pub triggers: Vec<Trigger>,
    pub events: Vec<GameEvent>,
}

/// End-screen text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndScreen {
    pub title: &'static str,
    pub prompt: &'static str,
    /// 0.0 - 1.0
    pub fade: f32,
}

/// Everything the HUD shows
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    /// Whole seconds left, rounded up
    pub time_left: u32,
    /// 1-based
    pub zone: usize,
    pub zone_count: usize,
    /// 1-based transport step
    pub step: usize,
    pub steps: usize,
    /// Active zone's cells for the strip display
    pub pattern: ZonePattern,
    pub end: Option<EndScreen>,
}

pub struct Session {
    pub state: GameState,
    pub transport: Transport,
    pub recording: RecordingSession,
    input: TickInput,
    pending_capture: Option<Capture>,
}

impl Session {
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport, scheduler: Box<dyn Scheduler>) -> Self {
        let transport = Transport::new(&tuning, scheduler);
        Self {
            state: GameState::new(seed, tuning, viewport),
            transport,
            recording: RecordingSession::new(),
            input: TickInput::default(),
            pending_capture: None,
        }
    }

    /// Demo mode toggle
    pub fn set_autopilot(&mut self, on: bool) {
        self.input.autopilot = on;
    }

    /// Queue an input for the next frame. Export, fullscreen and mute are
    /// host actions and are not queued.
    pub fn press(&mut self, event: InputEvent) {
        match event {
            InputEvent::Start => self.input.start = true,
            InputEvent::Jump => self.input.jump = true,
            InputEvent::Export | InputEvent::ToggleFullscreen | InputEvent::ToggleMute => {}
        }
    }

    pub fn resize(&mut self, aspect: f32) {
        world::resize(&mut self.state, aspect);
    }

    /// Run one frame. `audio_now` is the audio-clock time, or `None` when no
    /// audio backend is running.
    pub fn frame(&mut self, dt: f32, audio_now: Option<f64>) -> FrameOutput {
        let input = TickInput {
            autopilot: self.input.autopilot,
            ..std::mem::take(&mut self.input)
        };
        self.input.autopilot = input.autopilot;

        tick(&mut self.state, &input, dt);
        let events = self.state.take_events();

        for event in &events {
            match event {
                GameEvent::Started => self.start_audio(audio_now),
                GameEvent::Ended { .. } => self.end_audio(audio_now.unwrap_or(0.0)),
                _ => {}
            }
        }

        let triggers = match audio_now {
            Some(now) => self
                .transport
                .pump(now, &self.state.grid, self.state.is_over()),
            None => Vec::new(),
        };
        self.recording.record(&triggers);

        FrameOutput { triggers, events }
    }

    fn start_audio(&mut self, audio_now: Option<f64>) {
        let Some(now) = audio_now else {
            log::warn!("Starting without audio; nothing will be recorded");
            return;
        };
        match self.transport.start(now) {
            Ok(()) => self.recording.start(now),
            Err(e) => log::warn!("Transport failed to start: {}", e),
        }
    }

    fn end_audio(&mut self, now: f64) {
        self.transport.stop();
        self.pending_capture = self.recording.begin_finalize(now);
    }

    /// Capture waiting to be finalized, if any
    pub fn take_pending_capture(&mut self) -> Option<Capture> {
        self.pending_capture.take()
    }

    /// Deliver a finalization result
    pub fn complete_finalization(&mut self, result: Result<AudioArtifact, RecordingError>) {
        self.recording.complete(result);
    }

    /// Finalize on the calling thread
    pub fn finalize_now(&mut self) -> Result<(), RecordingError> {
        let capture = self
            .take_pending_capture()
            .ok_or(RecordingError::NotCapturing)?;
        self.complete_finalization(capture.finalize());
        Ok(())
    }

    /// Artifact for an export request; `None` while finalizing or when no
    /// audio was recorded
    pub fn export(&self) -> Option<&AudioArtifact> {
        if self.state.phase != GamePhase::Ended {
            return None;
        }
        self.recording.export()
    }

    pub fn recording_status(&self) -> RecordingStatus {
        self.recording.status()
    }

    pub fn hud(&self) -> HudSnapshot {
        let state = &self.state;
        let pattern = state
            .grid
            .pattern(state.zone)
            .copied()
            .unwrap_or([[None; crate::consts::LANES]; STEPS]);
        let end = state.end_reason.map(|reason| EndScreen {
            title: reason.title(),
            prompt: self.recording.status().prompt(),
            fade: state.fade_progress(),
        });
        HudSnapshot {
            time_left: state.time_remaining.max(0.0).ceil() as u32,
            zone: state.zone + 1,
            zone_count: ZONE_COUNT,
            step: self.transport.current_step() + 1,
            steps: STEPS,
            pattern,
            end,
        }
    }
}
