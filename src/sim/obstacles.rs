//! Procedural obstacle spawning
//!
//! A frontier (`next_obstacle_x`) walks ahead of the screen. Whenever it falls
//! inside the lookahead window it drops an obstacle and jumps forward by a
//! random gap. Obstacles are never pruned; sessions are bounded by the countdown.

use rand::Rng;

use super::state::{GameState, Obstacle};
use crate::consts::{GROUND_Y, OBSTACLE_VARIANTS};

/// Fill the lookahead window. Returns how many obstacles were added.
pub fn generate(state: &mut GameState) -> usize {
    let horizon = state.world_x + state.viewport.width + state.tuning.spawn_lookahead;
    let size = state.tuning.obstacle_size;
    let (min_gap, max_gap) = (state.tuning.min_gap, state.tuning.max_gap);

    let mut spawned = 0;
    while state.next_obstacle_x < horizon {
        state.obstacles.push(Obstacle {
            x: state.next_obstacle_x,
            y: GROUND_Y - size,
            width: size,
            height: size,
            variant: state.rng.random_range(0..OBSTACLE_VARIANTS),
        });
        let gap = if max_gap > min_gap {
            state.rng.random_range(min_gap..=max_gap)
        } else {
            min_gap
        };
        state.next_obstacle_x += gap;
        spawned += 1;
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    #[test]
    fn test_first_obstacle_is_offscreen() {
        let mut state = GameState::new(5, Tuning::default(), Viewport::default());
        let spawned = generate(&mut state);
        assert!(spawned >= 1);
        assert_eq!(state.obstacles[0].x, DEFAULT_BASE_W * FIRST_SPAWN_FACTOR);
        assert_eq!(state.obstacles[0].y, GROUND_Y - OBSTACLE_SIZE);
        assert!(state.obstacles.iter().all(|o| o.variant < OBSTACLE_VARIANTS));
    }

    #[test]
    fn test_generate_is_idempotent_without_movement() {
        let mut state = GameState::new(5, Tuning::default(), Viewport::default());
        generate(&mut state);
        let count = state.obstacles.len();
        assert_eq!(generate(&mut state), 0);
        assert_eq!(state.obstacles.len(), count);
    }

    #[test]
    fn test_same_seed_same_course() {
        let mut a = GameState::new(42, Tuning::default(), Viewport::default());
        let mut b = GameState::new(42, Tuning::default(), Viewport::default());
        for step in 0..50 {
            a.world_x = step as f32 * 100.0;
            b.world_x = step as f32 * 100.0;
            generate(&mut a);
            generate(&mut b);
        }
        let xs_a: Vec<f32> = a.obstacles.iter().map(|o| o.x).collect();
        let xs_b: Vec<f32> = b.obstacles.iter().map(|o| o.x).collect();
        assert_eq!(xs_a, xs_b);
    }

    proptest! {
        #[test]
        fn prop_frontier_and_spacing(seed in any::<u64>(), advances in proptest::collection::vec(0.0f32..600.0, 1..60)) {
            let mut state = GameState::new(seed, Tuning::default(), Viewport::default());
            for advance in advances {
                state.world_x += advance;
                generate(&mut state);
                prop_assert!(state.next_obstacle_x >= state.world_x + state.viewport.width);
            }
            for pair in state.obstacles.windows(2) {
                let gap = pair[1].x - pair[0].x;
                prop_assert!(gap >= MIN_GAP - 0.01 && gap <= MAX_GAP + 0.01, "gap {}", gap);
            }
        }
    }
}
