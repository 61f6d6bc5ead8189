//! Axis-aligned hitboxes
//!
//! Both the player and obstacle boxes are shrunk by a padding inset before the
//! overlap test, so grazing contact does not count.

use glam::Vec2;

use super::state::{Obstacle, Player};

/// Axis-aligned box from its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Shrink each side by `padding`; never below zero size
    pub fn inset(&self, padding: f32) -> Self {
        let size = (self.size - Vec2::splat(2.0 * padding)).max(Vec2::ZERO);
        Self {
            min: self.min + Vec2::splat(padding),
            size,
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }

    pub fn for_player(player: &Player, world_x: f32) -> Self {
        Self::new(world_x + player.screen_x, player.y, player.width, player.height)
    }

    pub fn for_obstacle(obstacle: &Obstacle) -> Self {
        Self::new(obstacle.x, obstacle.y, obstacle.width, obstacle.height)
    }
}

/// Overlap after insetting both boxes
pub fn padded_overlap(a: &Aabb, b: &Aabb, padding: f32) -> bool {
    a.inset(padding).overlaps(&b.inset(padding))
}

/// Whether the player touches any obstacle
pub fn player_hits_any(player: &Aabb, obstacles: &[Obstacle], padding: f32) -> bool {
    let hitbox = player.inset(padding);
    obstacles
        .iter()
        .any(|obstacle| hitbox.overlaps(&Aabb::for_obstacle(obstacle).inset(padding)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_basic() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Aabb::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Aabb::new(10.0, 0.0, 10.0, 10.0))); // touching
        assert!(!a.overlaps(&Aabb::new(0.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_padding_margin_is_forgiving() {
        let player = Aabb::new(0.0, 0.0, 20.0, 20.0);
        // Raw overlap of 6 is inside the combined 8-unit margin
        let grazing = Aabb::new(14.0, 0.0, 20.0, 20.0);
        assert!(player.overlaps(&grazing));
        assert!(!padded_overlap(&player, &grazing, 4.0));

        // Raw overlap of 10 goes past it
        let solid = Aabb::new(10.0, 0.0, 20.0, 20.0);
        assert!(padded_overlap(&player, &solid, 4.0));
    }

    #[test]
    fn test_inset_never_negative() {
        let tiny = Aabb::new(0.0, 0.0, 4.0, 4.0).inset(5.0);
        assert_eq!(tiny.size, Vec2::ZERO);
    }

    #[test]
    fn test_player_hits_any() {
        let player = Aabb::new(100.0, 170.0, 20.0, 20.0);
        let far = Obstacle {
            x: 400.0,
            y: 170.0,
            width: 20.0,
            height: 20.0,
            variant: 0,
        };
        let near = Obstacle { x: 105.0, ..far.clone() };
        assert!(!player_hits_any(&player, &[far.clone()], 4.0));
        assert!(player_hits_any(&player, &[far, near], 4.0));
        assert!(!player_hits_any(&player, &[], 4.0));
    }
}
