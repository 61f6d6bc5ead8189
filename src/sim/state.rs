//! Game state and core simulation types
//!
//! Everything the per-frame update reads or writes lives in `GameState`; the
//! update functions take it by `&mut` instead of touching globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sequencer::{Lane, Note, SequencerGrid};
use crate::tuning::Tuning;

/// Current phase of the run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, waiting for the start request
    Idle,
    /// Active gameplay
    Playing,
    /// Run ended; terminal
    Ended,
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Ran into an obstacle
    Hit,
    /// Countdown reached zero
    Time,
}

impl EndReason {
    /// End-screen title
    pub fn title(&self) -> &'static str {
        match self {
            EndReason::Hit => "GAME OVER",
            EndReason::Time => "TIME UP",
        }
    }
}

/// Things that happened during a tick, drained by the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Started,
    /// A jump action; `launched` is false for presses while airborne
    Jumped { launched: bool },
    NoteWritten {
        zone: usize,
        step: usize,
        lane: Lane,
        note: Note,
        replaced: Option<Note>,
    },
    ZoneEntered { zone: usize },
    Ended { reason: EndReason },
}

/// Logical viewport: fixed height, width follows the window aspect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_BASE_W,
            height: BASE_H,
        }
    }
}

impl Viewport {
    /// Viewport for a window aspect ratio (width / height)
    pub fn from_aspect(aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            DEFAULT_BASE_W / BASE_H
        };
        Self {
            width: (BASE_H * aspect).round().max(1.0),
            height: BASE_H,
        }
    }

    /// A zone spans exactly one screen
    pub fn zone_length(&self) -> f32 {
        self.width
    }
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Fixed horizontal screen offset (recomputed on resize)
    pub screen_x: f32,
    /// Top edge, y grows downward
    pub y: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub on_ground: bool,
}

impl Player {
    /// Standing on the ground line
    pub fn new(viewport: &Viewport, tuning: &Tuning) -> Self {
        let size = tuning.player_size;
        Self {
            screen_x: (viewport.width * tuning.player_screen_fraction).round(),
            y: GROUND_Y - size,
            vy: 0.0,
            width: size,
            height: size,
            on_ground: true,
        }
    }

    /// y of the top edge when standing
    pub fn ground_top(&self) -> f32 {
        GROUND_Y - self.height
    }
}

/// A ground obstacle. Never removed once spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Sprite variant
    pub variant: u8,
}

/// Speed streak left behind on a jump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashParticle {
    pub pos: Vec2,
    pub size: Vec2,
    /// Seconds remaining
    pub life: f32,
}

/// Eighth-note glyph floating up from a jump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteBurst {
    pub pos: Vec2,
    pub vy: f32,
    /// Seconds remaining
    pub life: f32,
    /// Radians
    pub tilt: f32,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub viewport: Viewport,
    pub phase: GamePhase,
    pub end_reason: Option<EndReason>,
    /// Seconds since the run ended, capped at the fade duration
    pub end_fade: f32,
    /// Countdown (seconds)
    pub time_remaining: f32,
    /// Seconds of play
    pub elapsed: f32,
    pub world_x: f32,
    pub camera_x: f32,
    pub zone: usize,
    pub player: Player,
    /// Spawn order, never pruned
    pub obstacles: Vec<Obstacle>,
    /// Where the next obstacle goes
    pub next_obstacle_x: f32,
    pub grid: SequencerGrid,
    /// Visual particles (not gameplay-affecting)
    pub dashes: Vec<DashParticle>,
    pub note_bursts: Vec<NoteBurst>,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport) -> Self {
        let player = Player::new(&viewport, &tuning);
        let next_obstacle_x = viewport.width * tuning.first_spawn_factor;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_remaining: tuning.time_limit,
            tuning,
            viewport,
            phase: GamePhase::Idle,
            end_reason: None,
            end_fade: 0.0,
            elapsed: 0.0,
            world_x: 0.0,
            camera_x: 0.0,
            zone: 0,
            player,
            obstacles: Vec::new(),
            next_obstacle_x,
            grid: SequencerGrid::new(),
            dashes: Vec::new(),
            note_bursts: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    /// Idle → Playing. Returns false if already started.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.time_remaining = self.tuning.time_limit;
        self.events.push(GameEvent::Started);
        log::info!("Run started (seed {})", self.seed);
        true
    }

    /// Playing → Ended, first caller wins. Returns whether this call ended it.
    pub fn request_end(&mut self, reason: EndReason) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Ended;
        self.end_reason = Some(reason);
        self.end_fade = 0.0;
        self.events.push(GameEvent::Ended { reason });
        log::info!(
            "Run ended: {:?} at x={:.0}, zone {}, {} notes written",
            reason,
            self.world_x,
            self.zone + 1,
            self.grid.filled_cells()
        );
        true
    }

    /// Fade completion in [0, 1]
    pub fn fade_progress(&self) -> f32 {
        if self.tuning.end_fade_duration <= 0.0 {
            return 1.0;
        }
        (self.end_fade / self.tuning.end_fade_duration).clamp(0.0, 1.0)
    }

    /// Player box in world space
    pub fn player_world_pos(&self) -> Vec2 {
        Vec2::new(self.world_x + self.player.screen_x, self.player.y)
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
