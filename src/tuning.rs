//! Data-driven game balance
//!
//! Every gameplay number the simulation and transport read lives here so a run
//! can be re-tuned from JSON without touching code. Defaults match `consts`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Why a tuning file was rejected
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("obstacle gap range is empty: min {min} > max {max}")]
    GapRange { min: f32, max: f32 },

    #[error("jump_velocity must be negative (upward), got {0}")]
    JumpDirection(f32),

    #[error("camera_smoothing must be in (0, 1], got {0}")]
    CameraSmoothing(f32),

    #[error("lane thresholds out of order: high {high} must be below mid {mid}")]
    LaneThresholds { high: f32, mid: f32 },
}

/// Gameplay balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_speed: f32,
    pub gravity: f32,
    /// Upward impulse (negative: y grows downward)
    pub jump_velocity: f32,
    pub player_size: f32,
    pub player_screen_fraction: f32,

    // === Clock ===
    pub time_limit: f32,
    pub max_frame_dt: f32,
    pub end_fade_duration: f32,
    pub camera_smoothing: f32,

    // === Obstacles ===
    pub obstacle_size: f32,
    pub hitbox_padding: f32,
    pub min_gap: f32,
    pub max_gap: f32,
    pub spawn_lookahead: f32,
    pub first_spawn_factor: f32,

    // === Lanes ===
    pub lane_high_below: f32,
    pub lane_mid_below: f32,

    // === Transport ===
    pub bpm: f64,
    pub intro_loops: u64,
    pub intro_velocity: f32,
    pub base_velocity: f32,
    pub downbeat_boost: f32,
    pub transport_start_delay: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            gravity: GRAVITY,
            jump_velocity: JUMP_VY,
            player_size: PLAYER_SIZE,
            player_screen_fraction: PLAYER_SCREEN_FRACTION,

            time_limit: TIME_LIMIT,
            max_frame_dt: MAX_FRAME_DT,
            end_fade_duration: END_FADE_DURATION,
            camera_smoothing: CAMERA_SMOOTHING,

            obstacle_size: OBSTACLE_SIZE,
            hitbox_padding: HITBOX_PADDING,
            min_gap: MIN_GAP,
            max_gap: MAX_GAP,
            spawn_lookahead: SPAWN_LOOKAHEAD,
            first_spawn_factor: FIRST_SPAWN_FACTOR,

            lane_high_below: LANE_HIGH_BELOW,
            lane_mid_below: LANE_MID_BELOW,

            bpm: BPM,
            intro_loops: INTRO_LOOPS,
            intro_velocity: INTRO_VELOCITY,
            base_velocity: BASE_VELOCITY,
            downbeat_boost: DOWNBEAT_BOOST,
            transport_start_delay: TRANSPORT_START_DELAY,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive: [(&'static str, f64); 7] = [
            ("player_speed", self.player_speed as f64),
            ("gravity", self.gravity as f64),
            ("time_limit", self.time_limit as f64),
            ("max_frame_dt", self.max_frame_dt as f64),
            ("obstacle_size", self.obstacle_size as f64),
            ("min_gap", self.min_gap as f64),
            ("bpm", self.bpm),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(TuningError::NotPositive { field, value });
            }
        }
        if self.jump_velocity >= 0.0 || self.jump_velocity.is_nan() {
            return Err(TuningError::JumpDirection(self.jump_velocity));
        }
        if !(self.camera_smoothing > 0.0 && self.camera_smoothing <= 1.0) {
            return Err(TuningError::CameraSmoothing(self.camera_smoothing));
        }
        if self.min_gap > self.max_gap {
            return Err(TuningError::GapRange {
                min: self.min_gap,
                max: self.max_gap,
            });
        }
        if self.lane_high_below >= self.lane_mid_below {
            return Err(TuningError::LaneThresholds {
                high: self.lane_high_below,
                mid: self.lane_mid_below,
            });
        }
        Ok(())
    }

    /// Apex height of a grounded jump (projectile symmetry)
    pub fn jump_apex(&self) -> f32 {
        self.jump_velocity * self.jump_velocity / (2.0 * self.gravity)
    }

    /// Time from takeoff back to the ground line
    pub fn airtime(&self) -> f32 {
        2.0 * self.jump_velocity.abs() / self.gravity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "player_speed": 300.0, "bpm": 90.0 }"#).unwrap();
        assert_eq!(tuning.player_speed, 300.0);
        assert_eq!(tuning.bpm, 90.0);
        assert_eq!(tuning.gravity, GRAVITY);
        assert_eq!(tuning.min_gap, MIN_GAP);
    }

    #[test]
    fn test_rejects_inverted_gap_range() {
        let err = Tuning::from_json(r#"{ "min_gap": 500.0, "max_gap": 100.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::GapRange { .. }));
    }

    #[test]
    fn test_rejects_zero_bpm() {
        let err = Tuning::from_json(r#"{ "bpm": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::NotPositive { field: "bpm", .. }));
    }

    #[test]
    fn test_rejects_downward_jump() {
        for json in [r#"{ "jump_velocity": 0.0 }"#, r#"{ "jump_velocity": 520.0 }"#] {
            let err = Tuning::from_json(json).unwrap_err();
            assert!(matches!(err, TuningError::JumpDirection(_)));
        }
    }

    #[test]
    fn test_camera_smoothing_range() {
        for bad in [0.0, -0.1, 1.5] {
            let json = format!(r#"{{ "camera_smoothing": {bad} }}"#);
            let err = Tuning::from_json(&json).unwrap_err();
            assert!(matches!(err, TuningError::CameraSmoothing(_)), "{bad}");
        }
        assert!(Tuning::from_json(r#"{ "camera_smoothing": 1.0 }"#).is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_default_jump_shape() {
        let tuning = Tuning::default();
        // 520^2 / 2800
        assert!((tuning.jump_apex() - 96.571).abs() < 0.01);
        assert!((tuning.airtime() - 0.7429).abs() < 0.001);
    }
}
