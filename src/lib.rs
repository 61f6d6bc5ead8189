//! Music Runner - a side-scrolling runner that composes while you jump
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, world, obstacles, game state)
//! - `sequencer`: Step grid written by jumps and the beat transport that reads it
//! - `audio`: Voice definitions and offline rendering (Web Audio on wasm)
//! - `recording`: Session capture and WAV export
//! - `session`: Frame orchestration tying the above together
//! - `platform`: Browser/native input abstraction
//! - `assets`: Sprite loading with ordered fallbacks
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod audio;
pub mod platform;
pub mod recording;
pub mod sequencer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical canvas height; width follows the window aspect ratio
    pub const BASE_H: f32 = 200.0;
    /// Logical width used before the first resize
    pub const DEFAULT_BASE_W: f32 = 900.0;

    /// Sequencer shape
    pub const STEPS: usize = 8;
    pub const LANES: usize = 3;
    /// Authored zones, one instrument slot each
    pub const ZONE_COUNT: usize = 30;

    /// Top of the ground strip (y grows downward)
    pub const GROUND_Y: f32 = 190.0;
    pub const GROUND_HEIGHT: f32 = 40.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 20.0;
    pub const PLAYER_SPEED: f32 = 220.0;
    pub const GRAVITY: f32 = 1400.0;
    pub const JUMP_VY: f32 = -520.0;
    /// Player screen offset as a fraction of viewport width
    pub const PLAYER_SCREEN_FRACTION: f32 = 0.28;

    /// Countdown length (seconds)
    pub const TIME_LIMIT: f32 = 60.0;
    /// Frame dt cap to survive tab-switch stalls
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Post-game fade length (seconds)
    pub const END_FADE_DURATION: f32 = 1.2;
    /// Camera lag filter factor per frame
    pub const CAMERA_SMOOTHING: f32 = 0.12;

    /// Obstacle defaults
    pub const OBSTACLE_SIZE: f32 = 20.0;
    pub const OBSTACLE_VARIANTS: u8 = 3;
    pub const HITBOX_PADDING: f32 = 4.0;
    pub const MIN_GAP: f32 = 220.0;
    pub const MAX_GAP: f32 = 420.0;
    pub const SPAWN_LOOKAHEAD: f32 = 300.0;
    /// First obstacle appears this many viewport widths ahead
    pub const FIRST_SPAWN_FACTOR: f32 = 1.2;

    /// Altitude thresholds splitting the three lanes (screen y)
    pub const LANE_HIGH_BELOW: f32 = 70.0;
    pub const LANE_MID_BELOW: f32 = 110.0;

    /// Particle lifetimes (seconds)
    pub const DASH_LIFE: f32 = 0.7;
    pub const NOTE_LIFE: f32 = 0.9;
    pub const NOTE_RISE_SPEED: f32 = 18.0;

    /// Transport defaults
    pub const BPM: f64 = 120.0;
    pub const INTRO_LOOPS: u64 = 3;
    pub const INTRO_VELOCITY: f32 = 0.95;
    pub const BASE_VELOCITY: f32 = 0.7;
    pub const DOWNBEAT_BOOST: f32 = 1.15;
    pub const TRANSPORT_START_DELAY: f64 = 0.05;

    /// Recording output
    pub const SAMPLE_RATE: u32 = 44_100;
    pub const MASTER_GAIN: f32 = 0.9;
}
