//! Vertical player physics
//!
//! Semi-implicit Euler under constant gravity. Jumps are a fixed impulse and
//! purely ballistic: no double jump and no hold-to-extend.

use super::state::Player;

/// Integrate one frame and resolve the ground contact
pub fn integrate(player: &mut Player, gravity: f32, dt: f32) {
    player.vy += gravity * dt;
    player.y += player.vy * dt;

    let ground_top = player.ground_top();
    if player.y >= ground_top {
        player.y = ground_top;
        player.vy = 0.0;
        player.on_ground = true;
    } else {
        player.on_ground = false;
    }
}

/// Apply the jump impulse if grounded. Returns whether the player left the ground.
pub fn try_jump(player: &mut Player, impulse: f32) -> bool {
    if !player.on_ground {
        return false;
    }
    player.vy = impulse;
    player.on_ground = false;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;

    fn player() -> Player {
        Player::new(&Viewport::default(), &Tuning::default())
    }

    #[test]
    fn test_resting_player_stays_grounded() {
        let mut p = player();
        for _ in 0..10 {
            integrate(&mut p, GRAVITY, 1.0 / 60.0);
        }
        assert!(p.on_ground);
        assert_eq!(p.y, p.ground_top());
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_jump_rises_then_lands() {
        let mut p = player();
        let dt = 1.0 / 60.0;
        let ground = p.ground_top();

        assert!(try_jump(&mut p, JUMP_VY));
        integrate(&mut p, GRAVITY, dt);
        assert!(p.y < ground, "first frame must rise");
        assert!(!p.on_ground);

        let mut elapsed = dt;
        let mut apex = p.y;
        while !p.on_ground && elapsed < 2.0 {
            integrate(&mut p, GRAVITY, dt);
            apex = apex.min(p.y);
            elapsed += dt;
        }

        assert!(p.on_ground);
        assert_eq!(p.y, ground);
        // Ballistic airtime 2 * 520 / 1400 = 0.743s, within a frame or two
        let airtime = 2.0 * JUMP_VY.abs() / GRAVITY;
        assert!((elapsed - airtime).abs() < 3.0 * dt, "airtime {elapsed}");
        // Apex about 96.6 above the ground
        assert!((ground - apex - 96.6).abs() < 6.0, "apex {apex}");
    }

    #[test]
    fn test_no_double_jump() {
        let mut p = player();
        assert!(try_jump(&mut p, JUMP_VY));
        integrate(&mut p, GRAVITY, 1.0 / 60.0);
        let vy = p.vy;
        assert!(!try_jump(&mut p, JUMP_VY));
        assert_eq!(p.vy, vy);
    }
}
