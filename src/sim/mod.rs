//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Capped frame dt
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod obstacles;
pub mod physics;
pub mod state;
pub mod tick;
pub mod world;

pub use collision::{Aabb, padded_overlap, player_hits_any};
pub use state::{
    DashParticle, EndReason, GameEvent, GamePhase, GameState, NoteBurst, Obstacle, Player,
    Viewport,
};
pub use tick::{TickInput, jump_action, tick};
pub use world::zone_index;
