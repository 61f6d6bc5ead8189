//! Per-frame simulation update
//!
//! Order within a playing frame: jump action, particles, countdown, world and
//! camera, physics, obstacle spawning, collision. The countdown and collision
//! both end the run through the one-way `request_end` latch.

use glam::Vec2;
use rand::Rng;

use super::collision::{Aabb, player_hits_any};
use super::state::{DashParticle, EndReason, GameEvent, GamePhase, GameState, NoteBurst};
use super::{obstacles, physics, world};
use crate::consts::*;
use crate::sequencer::{lane_for_height, step_index};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Leave the start screen
    pub start: bool,
    /// Jump (space / tap); key repeats are filtered upstream
    pub jump: bool,
    /// Demo mode - jump automatically over obstacles
    pub autopilot: bool,
}

/// Advance the game state by one frame of `dt` seconds (capped)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, state.tuning.max_frame_dt);

    match state.phase {
        GamePhase::Idle => {
            if input.start {
                state.start();
            }
            return;
        }
        GamePhase::Ended => {
            state.end_fade = (state.end_fade + dt).min(state.tuning.end_fade_duration);
            world::follow_camera(state);
            return;
        }
        GamePhase::Playing => {}
    }

    if input.jump || (input.autopilot && autopilot_wants_jump(state)) {
        jump_action(state);
    }

    update_particles(state, dt);

    state.elapsed += dt;
    state.time_remaining -= dt;
    if state.time_remaining <= 0.0 {
        state.time_remaining = 0.0;
        state.request_end(EndReason::Time);
        return;
    }

    world::advance(state, dt);
    physics::integrate(&mut state.player, state.tuning.gravity, dt);
    obstacles::generate(state);

    let player_box = Aabb::for_player(&state.player, state.world_x);
    if player_hits_any(&player_box, &state.obstacles, state.tuning.hitbox_padding) {
        state.request_end(EndReason::Hit);
    }
}

/// A jump press: particles, the impulse (if grounded) and a note write.
///
/// The note is written even when airborne; height picks the lane, position
/// within the zone picks the step.
pub fn jump_action(state: &mut GameState) {
    if state.phase != GamePhase::Playing {
        return;
    }

    spawn_dash(state);
    spawn_note_burst(state);

    let launched = physics::try_jump(&mut state.player, state.tuning.jump_velocity);
    state.events.push(GameEvent::Jumped { launched });

    let step = step_index(state.world_x, state.viewport.zone_length());
    let lane = lane_for_height(
        state.player.y,
        state.tuning.lane_high_below,
        state.tuning.lane_mid_below,
    );
    let note = lane.random_note(&mut state.rng);
    let zone = state.zone;
    let replaced = state.grid.write(zone, step, lane, note);
    log::trace!("Note {} at zone {} step {} lane {:?}", note, zone, step, lane);
    state.events.push(GameEvent::NoteWritten {
        zone,
        step,
        lane,
        note,
        replaced,
    });
}

fn spawn_dash(state: &mut GameState) {
    let p = state.player_world_pos();
    state.dashes.push(DashParticle {
        pos: Vec2::new(p.x - 10.0, p.y + state.player.height * 0.55),
        size: Vec2::new(18.0, 3.0),
        life: DASH_LIFE,
    });
}

fn spawn_note_burst(state: &mut GameState) {
    let p = state.player_world_pos();
    let tilt = state.rng.random_range(-0.25f32..0.25);
    state.note_bursts.push(NoteBurst {
        pos: Vec2::new(p.x - 6.0, p.y - 6.0),
        vy: -NOTE_RISE_SPEED,
        life: NOTE_LIFE,
        tilt,
    });
}

fn update_particles(state: &mut GameState, dt: f32) {
    for dash in state.dashes.iter_mut() {
        dash.life -= dt;
    }
    state.dashes.retain(|d| d.life > 0.0);

    for burst in state.note_bursts.iter_mut() {
        burst.life -= dt;
        burst.pos.y += burst.vy * dt;
    }
    state.note_bursts.retain(|n| n.life > 0.0);
}

/// Jump when the next obstacle is close enough to clear
fn autopilot_wants_jump(state: &GameState) -> bool {
    if !state.player.on_ground {
        return false;
    }
    let front = state.world_x + state.player.screen_x;
    state
        .obstacles
        .iter()
        .map(|o| o.x - front)
        .any(|distance| distance > 20.0 && distance <= 80.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::Lane;
    use crate::sim::Obstacle;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn playing() -> GameState {
        let mut state = GameState::new(12345, Tuning::default(), Viewport::default());
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        state.take_events();
        state
    }

    #[test]
    fn test_tick_idle_to_playing() {
        let mut state = GameState::new(12345, Tuning::default(), Viewport::default());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.world_x, 0.0);

        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.events, vec![GameEvent::Started]);
    }

    #[test]
    fn test_dt_is_capped() {
        let mut state = playing();
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.world_x - PLAYER_SPEED * MAX_FRAME_DT).abs() < 1e-3);
        assert!((state.time_remaining - (TIME_LIMIT - MAX_FRAME_DT)).abs() < 1e-4);
    }

    #[test]
    fn test_jump_writes_note_and_particles() {
        let mut state = playing();
        state.world_x = 340.0;
        tick(
            &mut state,
            &TickInput {
                jump: true,
                ..Default::default()
            },
            DT,
        );

        assert!(!state.player.on_ground);
        assert_eq!(state.dashes.len(), 1);
        assert_eq!(state.note_bursts.len(), 1);

        let written = state.events.iter().find_map(|e| match e {
            GameEvent::NoteWritten { zone, step, lane, note, .. } => Some((*zone, *step, *lane, *note)),
            _ => None,
        });
        let (zone, step, lane, note) = written.unwrap();
        assert_eq!((zone, step, lane), (0, 3, Lane::Low));
        assert_eq!(state.grid.get(0, 3, Lane::Low), Some(note));
    }

    #[test]
    fn test_airborne_press_writes_without_impulse() {
        let mut state = playing();
        state.player.y = 50.0;
        state.player.vy = -100.0;
        state.player.on_ground = false;

        jump_action(&mut state);

        assert_eq!(state.player.vy, -100.0);
        assert!(state.events.contains(&GameEvent::Jumped { launched: false }));
        let step = step_index(state.world_x, state.viewport.zone_length());
        assert!(state.grid.get(0, step, Lane::High).is_some());
    }

    #[test]
    fn test_particles_expire() {
        let mut state = playing();
        jump_action(&mut state);
        let start_y = state.note_bursts[0].pos.y;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        // 0.5s: both alive, note drifted up
        assert_eq!(state.dashes.len(), 1);
        assert!(state.note_bursts[0].pos.y < start_y);
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.dashes.is_empty());
        assert!(state.note_bursts.is_empty());
    }

    #[test]
    fn test_countdown_ends_with_time() {
        let mut state = playing();
        let mut simulated = 0.0;
        while simulated < 61.0 {
            tick(&mut state, &TickInput::default(), 0.05);
            // Keep the course clear so only the clock can end the run
            state.obstacles.clear();
            simulated += 0.05;
        }
        assert_eq!(state.time_remaining, 0.0);
        assert_eq!(state.end_reason, Some(EndReason::Time));
        assert!(state.is_over());
    }

    #[test]
    fn test_collision_ends_with_hit_and_freezes_world() {
        let mut state = playing();
        let front = state.world_x + state.player.screen_x;
        state.obstacles.push(Obstacle {
            x: front + 2.0,
            y: GROUND_Y - OBSTACLE_SIZE,
            width: OBSTACLE_SIZE,
            height: OBSTACLE_SIZE,
            variant: 0,
        });
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.end_reason, Some(EndReason::Hit));

        // Frozen world, camera keeps settling, fade advances and caps
        let world_x = state.world_x;
        let camera_before = state.camera_x;
        for _ in 0..120 {
            tick(
                &mut state,
                &TickInput {
                    jump: true,
                    ..Default::default()
                },
                DT,
            );
        }
        assert_eq!(state.world_x, world_x);
        assert!((state.camera_x - world_x).abs() < (camera_before - world_x).abs());
        assert_eq!(state.end_fade, END_FADE_DURATION);
        assert_eq!(state.fade_progress(), 1.0);
        assert_eq!(state.grid.filled_cells(), 0);
    }

    #[test]
    fn test_autopilot_survives_obstacles() {
        let mut state = playing();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..(20 * 60) {
            tick(&mut state, &input, DT);
        }
        assert_eq!(state.phase, GamePhase::Playing, "hit at x={}", state.world_x);
        assert!(state.grid.filled_cells() > 0);
    }

    #[test]
    fn test_determinism() {
        let mut a = playing();
        let mut b = playing();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.world_x, b.world_x);
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        assert_eq!(a.grid, b.grid);
    }
}
