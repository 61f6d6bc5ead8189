//! Per-zone step grid
//!
//! Each zone owns an 8-step by 3-lane pattern. Jumps write into it (height picks
//! the lane, position picks the step) and the transport reads it back.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{LANES, STEPS, ZONE_COUNT};

/// Pentatonic pitch classes used by every lane bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pitch {
    C,
    D,
    E,
    G,
    A,
}

impl Pitch {
    pub const ALL: [Pitch; 5] = [Pitch::C, Pitch::D, Pitch::E, Pitch::G, Pitch::A];

    /// Semitones above C
    pub fn semitone(&self) -> i32 {
        match self {
            Pitch::C => 0,
            Pitch::D => 2,
            Pitch::E => 4,
            Pitch::G => 7,
            Pitch::A => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pitch::C => "C",
            Pitch::D => "D",
            Pitch::E => "E",
            Pitch::G => "G",
            Pitch::A => "A",
        }
    }
}

/// A pitch label such as `C4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch: Pitch,
    pub octave: u8,
}

impl Note {
    pub fn new(pitch: Pitch, octave: u8) -> Self {
        Self { pitch, octave }
    }

    /// MIDI note number (C4 = 60)
    pub fn midi(&self) -> i32 {
        12 * (self.octave as i32 + 1) + self.pitch.semitone()
    }

    /// Equal-tempered frequency, A4 = 440 Hz
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi() - 69) as f32 / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch.as_str(), self.octave)
    }
}

/// Pitch track selected by jump altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Low,
    Mid,
    High,
}

impl Lane {
    pub const ALL: [Lane; LANES] = [Lane::Low, Lane::Mid, Lane::High];

    pub fn index(&self) -> usize {
        match self {
            Lane::Low => 0,
            Lane::Mid => 1,
            Lane::High => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Octave of this lane's pitch bank
    pub fn octave(&self) -> u8 {
        match self {
            Lane::Low => 3,
            Lane::Mid => 4,
            Lane::High => 5,
        }
    }

    /// Notes this lane may write
    pub fn bank(&self) -> [Note; 5] {
        Pitch::ALL.map(|pitch| Note::new(pitch, self.octave()))
    }

    /// Pick a note from the bank
    pub fn random_note<R: Rng + ?Sized>(&self, rng: &mut R) -> Note {
        let bank = self.bank();
        bank[rng.random_range(0..bank.len())]
    }
}

/// Lane for a vertical position. Smaller y is higher on screen.
pub fn lane_for_height(y: f32, high_below: f32, mid_below: f32) -> Lane {
    if y < high_below {
        Lane::High
    } else if y < mid_below {
        Lane::Mid
    } else {
        Lane::Low
    }
}

/// Step under the player for a world position, always in `0..STEPS`
pub fn step_index(world_x: f32, zone_length: f32) -> usize {
    if zone_length <= 0.0 || !world_x.is_finite() {
        return 0;
    }
    let step_width = zone_length / STEPS as f32;
    let local_x = world_x.rem_euclid(zone_length);
    let step = (local_x / step_width).floor();
    (step.max(0.0) as usize).min(STEPS - 1)
}

/// One zone's pattern: `cells[step][lane]`
pub type ZonePattern = [[Option<Note>; LANES]; STEPS];

/// Patterns for every authored zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerGrid {
    zones: Vec<ZonePattern>,
}

impl Default for SequencerGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencerGrid {
    pub fn new() -> Self {
        Self {
            zones: vec![[[None; LANES]; STEPS]; ZONE_COUNT],
        }
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Write a note, replacing whatever was there. Returns the replaced note.
    pub fn write(&mut self, zone: usize, step: usize, lane: Lane, note: Note) -> Option<Note> {
        let cell = self
            .zones
            .get_mut(zone)?
            .get_mut(step)?
            .get_mut(lane.index())?;
        cell.replace(note)
    }

    pub fn get(&self, zone: usize, step: usize, lane: Lane) -> Option<Note> {
        self.zones
            .get(zone)
            .and_then(|pattern| pattern.get(step))
            .and_then(|lanes| lanes[lane.index()])
    }

    pub fn pattern(&self, zone: usize) -> Option<&ZonePattern> {
        self.zones.get(zone)
    }

    /// Non-empty lanes of one zone at one step
    pub fn notes_at(&self, zone: usize, step: usize) -> impl Iterator<Item = (Lane, Note)> + '_ {
        self.zones
            .get(zone)
            .and_then(|pattern| pattern.get(step))
            .into_iter()
            .flat_map(|lanes| {
                Lane::ALL
                    .into_iter()
                    .filter_map(move |lane| lanes[lane.index()].map(|note| (lane, note)))
            })
    }

    /// Number of filled cells across all zones
    pub fn filled_cells(&self) -> usize {
        self.zones
            .iter()
            .flat_map(|pattern| pattern.iter())
            .flat_map(|lanes| lanes.iter())
            .filter(|cell| cell.is_some())
            .count()
    }
}
