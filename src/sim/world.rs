//! Scrolling world and camera

use super::state::{GameEvent, GameState, Viewport};
use crate::consts::ZONE_COUNT;

/// Zone under a world position, clamped to the last authored zone
pub fn zone_index(world_x: f32, zone_length: f32) -> usize {
    if zone_length <= 0.0 || world_x <= 0.0 {
        return 0;
    }
    ((world_x / zone_length).floor() as usize).min(ZONE_COUNT - 1)
}

/// Single-pole lag toward the target
#[inline]
pub fn smooth_camera(camera_x: f32, target: f32, factor: f32) -> f32 {
    camera_x + (target - camera_x) * factor
}

/// Scroll the world forward and follow with the camera
pub fn advance(state: &mut GameState, dt: f32) {
    state.world_x += state.tuning.player_speed * dt;
    follow_camera(state);

    let zone = zone_index(state.world_x, state.viewport.zone_length());
    if zone != state.zone {
        state.zone = zone;
        state.events.push(GameEvent::ZoneEntered { zone });
        log::debug!("Entered zone {}", zone + 1);
    }
}

/// Camera step without moving the world (keeps settling after the run ends)
pub fn follow_camera(state: &mut GameState) {
    state.camera_x = smooth_camera(state.camera_x, state.world_x, state.tuning.camera_smoothing);
}

/// Window resized: new width, zone length and player offset
pub fn resize(state: &mut GameState, aspect: f32) {
    state.viewport = Viewport::from_aspect(aspect);
    state.player.screen_x = (state.viewport.width * state.tuning.player_screen_fraction).round();
    state.zone = zone_index(state.world_x, state.viewport.zone_length());
}
