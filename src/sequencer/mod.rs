//! Step sequencer
//!
//! The grid is written from the simulation side (one write per jump) and read
//! from the audio side once per transport tick.

pub mod grid;
pub mod transport;

pub use grid::{Lane, Note, Pitch, SequencerGrid, ZonePattern, lane_for_height, step_index};
pub use transport::{ClockTick, FixedStepClock, Scheduler, Transport, TransportState, Trigger};
