//! Beat transport
//!
//! The transport is a looping eighth-note clock that runs on the audio side,
//! decoupled from the render loop. A `Scheduler` pushes `ClockTick`s into a
//! channel; the transport drains them, advances its monotonic step counter and
//! turns the grid cells under the playhead into `Trigger`s for the voices.

use std::sync::mpsc::{self, Receiver, Sender};

use super::grid::{Lane, Note, SequencerGrid};
use crate::audio::AudioError;
use crate::consts::STEPS;
use crate::tuning::Tuning;

/// One beat-clock pulse, stamped with audio-clock time (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    pub at: f64,
}

/// Source of clock ticks at a fixed interval
pub trait Scheduler {
    /// Begin sending a tick every `interval` seconds, the first at `first_at`
    fn start(&mut self, interval: f64, first_at: f64, ticks: Sender<ClockTick>)
    -> Result<(), AudioError>;

    /// Give clocks without their own timer a chance to emit due ticks
    fn poll(&mut self, _now: f64) {}

    /// Stop sending ticks
    fn stop(&mut self);
}

/// Clock driven by explicit time advances (headless runs, tests)
#[derive(Debug, Default)]
pub struct FixedStepClock {
    interval: f64,
    next_at: f64,
    ticks: Option<Sender<ClockTick>>,
}

impl FixedStepClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.ticks.is_some()
    }
}

impl Scheduler for FixedStepClock {
    fn start(
        &mut self,
        interval: f64,
        first_at: f64,
        ticks: Sender<ClockTick>,
    ) -> Result<(), AudioError> {
        if interval <= 0.0 {
            return Err(AudioError::Schedule(format!("interval must be positive, got {interval}")));
        }
        self.interval = interval;
        self.next_at = first_at;
        self.ticks = Some(ticks);
        Ok(())
    }

    fn poll(&mut self, now: f64) {
        let Some(ticks) = &self.ticks else { return };
        while self.next_at <= now {
            if ticks.send(ClockTick { at: self.next_at }).is_err() {
                self.ticks = None;
                return;
            }
            self.next_at += self.interval;
        }
    }

    fn stop(&mut self) {
        self.ticks = None;
    }
}

/// A note (or percussion hit) to play on one instrument slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    /// Instrument slot; zone `i` plays through slot `i`
    pub slot: usize,
    pub lane: Lane,
    pub note: Note,
    /// Audio-clock start time (seconds)
    pub at: f64,
    /// Seconds
    pub duration: f64,
    /// 0.0 - 1.0
    pub velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Looping beat clock reading the sequencer grid
pub struct Transport {
    bpm: f64,
    intro_loops: u64,
    intro_velocity: f32,
    base_velocity: f32,
    downbeat_boost: f32,
    start_delay: f64,
    global_step: u64,
    state: TransportState,
    scheduler: Box<dyn Scheduler>,
    sender: Sender<ClockTick>,
    receiver: Receiver<ClockTick>,
}

impl Transport {
    pub fn new(tuning: &Tuning, scheduler: Box<dyn Scheduler>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            bpm: tuning.bpm,
            intro_loops: tuning.intro_loops,
            intro_velocity: tuning.intro_velocity,
            base_velocity: tuning.base_velocity,
            downbeat_boost: tuning.downbeat_boost,
            start_delay: tuning.transport_start_delay,
            global_step: 0,
            state: TransportState::Stopped,
            scheduler,
            sender,
            receiver,
        }
    }

    /// Length of one step (an eighth note)
    pub fn step_duration(&self) -> f64 {
        60.0 / self.bpm / 2.0
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Step the playhead will sound next
    pub fn current_step(&self) -> usize {
        (self.global_step % STEPS as u64) as usize
    }

    pub fn loop_index(&self) -> u64 {
        self.global_step / STEPS as u64
    }

    pub fn is_intro(&self) -> bool {
        self.loop_index() < self.intro_loops
    }

    /// Reset the counter and start ticking shortly after `now`
    pub fn start(&mut self, now: f64) -> Result<(), AudioError> {
        self.scheduler.stop();
        self.clear();
        self.scheduler
            .start(self.step_duration(), now + self.start_delay, self.sender.clone())?;
        self.state = TransportState::Running;
        log::info!("Transport started at {:.0} bpm", self.bpm);
        Ok(())
    }

    /// Stop the clock and drop any ticks already queued
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.receiver.try_iter().for_each(drop);
        if self.state == TransportState::Running {
            log::info!("Transport stopped after {} steps", self.global_step);
        }
        self.state = TransportState::Stopped;
    }

    /// Cancel pending ticks and rewind the counter
    pub fn clear(&mut self) {
        self.receiver.try_iter().for_each(drop);
        self.global_step = 0;
    }

    /// Drain due ticks and return what they play.
    ///
    /// Suppressed ticks (game over) are consumed without sounding and without
    /// advancing the counter. Ticks more than a step behind `now` (a backlog
    /// from a stalled frame loop) advance the counter silently, so the
    /// playhead stays on the audio clock instead of bursting to catch up.
    pub fn pump(&mut self, now: f64, grid: &SequencerGrid, suppressed: bool) -> Vec<Trigger> {
        self.scheduler.poll(now);
        let ticks: Vec<ClockTick> = self.receiver.try_iter().collect();
        if !self.is_running() || suppressed {
            return Vec::new();
        }
        let stale_before = now - self.step_duration();
        let mut skipped = 0u64;
        let mut triggers = Vec::new();
        for tick in ticks {
            if tick.at < stale_before {
                self.global_step += 1;
                skipped += 1;
            } else {
                triggers.extend(self.tick(grid, tick.at));
            }
        }
        if skipped > 0 {
            log::debug!("Skipped {} stale transport steps", skipped);
        }
        triggers
    }

    /// Play one step at `at` and advance the counter
    pub fn tick(&mut self, grid: &SequencerGrid, at: f64) -> Vec<Trigger> {
        let step = self.current_step();
        let downbeat = step == 0;
        let base = if self.is_intro() {
            self.intro_velocity
        } else {
            self.base_velocity
        };
        let boost = if downbeat { self.downbeat_boost } else { 1.0 };
        let velocity = (base * boost).min(1.0);
        let duration = if downbeat {
            self.step_duration()
        } else {
            self.step_duration() / 2.0
        };

        let triggers = (0..grid.zone_count())
            .flat_map(|slot| {
                grid.notes_at(slot, step).map(move |(lane, note)| Trigger {
                    slot,
                    lane,
                    note,
                    at,
                    duration,
                    velocity,
                })
            })
            .collect();

        self.global_step += 1;
        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::grid::Pitch;

    fn transport() -> Transport {
        Transport::new(&Tuning::default(), Box::new(FixedStepClock::new()))
    }

    #[test]
    fn test_step_duration_is_eighth_note() {
        assert!((transport().step_duration() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_counter_and_loop_index() {
        let grid = SequencerGrid::new();
        let mut t = transport();
        for _ in 0..(STEPS * 3 + 2) {
            t.tick(&grid, 0.0);
        }
        assert_eq!(t.global_step(), 26);
        assert_eq!(t.current_step(), 2);
        assert_eq!(t.loop_index(), 3);
        assert!(!t.is_intro());
    }

    #[test]
    fn test_downbeat_emphasis_and_intro_ramp() {
        let mut grid = SequencerGrid::new();
        let note = Note::new(Pitch::E, 4);
        grid.write(0, 0, Lane::Mid, note);
        grid.write(0, 1, Lane::Mid, note);

        let mut t = transport();
        let down = t.tick(&grid, 0.0);
        let off = t.tick(&grid, 0.25);
        assert_eq!(down.len(), 1);
        assert_eq!(off.len(), 1);
        // Intro: 0.95 * 1.15 clamps to 1
        assert_eq!(down[0].velocity, 1.0);
        assert!((off[0].velocity - 0.95).abs() < 1e-6);
        assert!((down[0].duration - 0.25).abs() < 1e-9);
        assert!((off[0].duration - 0.125).abs() < 1e-9);

        // Skip past the intro loops
        while t.loop_index() < 3 || t.current_step() != 0 {
            t.tick(&grid, 0.0);
        }
        let down = t.tick(&grid, 0.0);
        let off = t.tick(&grid, 0.0);
        assert!((down[0].velocity - 0.805).abs() < 1e-6);
        assert!((off[0].velocity - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_every_zone_plays_through_its_slot() {
        let mut grid = SequencerGrid::new();
        grid.write(0, 0, Lane::Low, Note::new(Pitch::C, 3));
        grid.write(4, 0, Lane::High, Note::new(Pitch::A, 5));
        grid.write(4, 0, Lane::Low, Note::new(Pitch::D, 3));

        let triggers = transport().tick(&grid, 1.0);
        let slots: Vec<usize> = triggers.iter().map(|t| t.slot).collect();
        assert_eq!(slots, vec![0, 4, 4]);
        assert!(triggers.iter().all(|t| t.at == 1.0));
    }

    #[test]
    fn test_pump_follows_clock() {
        let mut grid = SequencerGrid::new();
        grid.write(0, 0, Lane::Low, Note::new(Pitch::C, 3));

        let mut t = transport();
        t.start(0.0).unwrap();
        // First tick lands after the start delay
        assert!(t.pump(0.01, &grid, false).is_empty());
        assert_eq!(t.global_step(), 0);

        let triggers = t.pump(0.06, &grid, false);
        assert_eq!(triggers.len(), 1);
        assert!((triggers[0].at - 0.05).abs() < 1e-9);

        // Two more steps by 0.56
        t.pump(0.56, &grid, false);
        assert_eq!(t.global_step(), 3);
    }

    #[test]
    fn test_clock_gap_plays_at_most_one_step() {
        let mut grid = SequencerGrid::new();
        for step in 0..STEPS {
            grid.write(0, step, Lane::Low, Note::new(Pitch::C, 3));
            grid.write(0, step, Lane::High, Note::new(Pitch::A, 5));
        }

        let mut t = transport();
        t.start(0.0).unwrap();
        // Thirty seconds without a frame
        let triggers = t.pump(30.0, &grid, false);
        assert!(triggers.len() <= 2, "{} triggers", triggers.len());
        assert!(triggers.iter().all(|tr| tr.at >= 30.0 - t.step_duration()));
        // Ticks at 0.05 + 0.25k up to 29.8: the playhead kept time
        assert_eq!(t.global_step(), 120);

        // Back to normal pacing afterwards
        let next = t.pump(30.06, &grid, false);
        assert_eq!(next.len(), 2);
        assert_eq!(t.global_step(), 121);
    }

    #[test]
    fn test_suppressed_ticks_do_not_advance() {
        let grid = SequencerGrid::new();
        let mut t = transport();
        t.start(0.0).unwrap();
        t.pump(1.0, &grid, true);
        assert_eq!(t.global_step(), 0);
    }

    #[test]
    fn test_stop_discards_pending_ticks() {
        let grid = SequencerGrid::new();
        let mut t = transport();
        t.start(0.0).unwrap();
        t.stop();
        assert_eq!(t.state(), TransportState::Stopped);
        assert!(t.pump(10.0, &grid, false).is_empty());
        assert_eq!(t.global_step(), 0);
    }

    #[test]
    fn test_fixed_clock_rejects_zero_interval() {
        let (tx, _rx) = mpsc::channel();
        let mut clock = FixedStepClock::new();
        assert!(clock.start(0.0, 0.0, tx).is_err());
        assert!(!clock.is_running());
    }
}
