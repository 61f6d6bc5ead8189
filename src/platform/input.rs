//! Input mapping
//!
//! Raw browser key codes and pointer positions become `InputEvent`s. Which keys
//! mean something depends on the phase: the start screen only listens for the
//! start keys, the end screen for export. Fullscreen and mute work anywhere.

use crate::sim::GamePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Start,
    Jump,
    Export,
    ToggleFullscreen,
    ToggleMute,
}

/// Map a `KeyboardEvent.code`. Auto-repeat is ignored.
pub fn map_key(code: &str, repeat: bool, phase: GamePhase) -> Option<InputEvent> {
    if repeat {
        return None;
    }
    match code {
        "KeyF" => return Some(InputEvent::ToggleFullscreen),
        "KeyM" => return Some(InputEvent::ToggleMute),
        _ => {}
    }
    match (phase, code) {
        (GamePhase::Idle, "Enter" | "Space") => Some(InputEvent::Start),
        (GamePhase::Playing, "Space") => Some(InputEvent::Jump),
        (GamePhase::Ended, "KeyE") => Some(InputEvent::Export),
        _ => None,
    }
}

/// Whether the browser's default action (page scroll on Space) should be
/// suppressed for this code
pub fn prevents_default(code: &str) -> bool {
    matches!(code, "Space" | "Enter")
}

/// Start-screen button, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartButton {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl StartButton {
    /// Centered button sized relative to the canvas
    pub fn centered(canvas_width: f32, canvas_height: f32) -> Self {
        let width = (canvas_width * 0.22).max(120.0);
        let height = (canvas_height * 0.14).max(36.0);
        Self {
            x: (canvas_width - width) / 2.0,
            y: canvas_height * 0.62 - height / 2.0,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Map a pointer press at canvas pixel `(px, py)`
pub fn map_pointer(px: f32, py: f32, button: &StartButton, phase: GamePhase) -> Option<InputEvent> {
    match phase {
        GamePhase::Idle if button.contains(px, py) => Some(InputEvent::Start),
        GamePhase::Playing => Some(InputEvent::Jump),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_keys_only_on_start_screen() {
        assert_eq!(map_key("Enter", false, GamePhase::Idle), Some(InputEvent::Start));
        assert_eq!(map_key("Space", false, GamePhase::Idle), Some(InputEvent::Start));
        assert_eq!(map_key("Enter", false, GamePhase::Playing), None);
        assert_eq!(map_key("KeyE", false, GamePhase::Idle), None);
    }

    #[test]
    fn test_jump_ignores_repeat() {
        assert_eq!(map_key("Space", false, GamePhase::Playing), Some(InputEvent::Jump));
        assert_eq!(map_key("Space", true, GamePhase::Playing), None);
        assert_eq!(map_key("Space", false, GamePhase::Ended), None);
    }

    #[test]
    fn test_export_and_fullscreen() {
        assert_eq!(map_key("KeyE", false, GamePhase::Ended), Some(InputEvent::Export));
        assert_eq!(map_key("KeyE", false, GamePhase::Playing), None);
        for phase in [GamePhase::Idle, GamePhase::Playing, GamePhase::Ended] {
            assert_eq!(map_key("KeyF", false, phase), Some(InputEvent::ToggleFullscreen));
            assert_eq!(map_key("KeyF", true, phase), None);
            assert_eq!(map_key("KeyM", false, phase), Some(InputEvent::ToggleMute));
        }
    }

    #[test]
    fn test_prevents_default() {
        assert!(prevents_default("Space"));
        assert!(!prevents_default("KeyE"));
    }

    #[test]
    fn test_start_button_hit() {
        let button = StartButton::centered(900.0, 200.0);
        let (cx, cy) = (button.x + button.width / 2.0, button.y + button.height / 2.0);
        assert!(button.contains(cx, cy));
        assert!(!button.contains(5.0, 5.0));

        assert_eq!(map_pointer(cx, cy, &button, GamePhase::Idle), Some(InputEvent::Start));
        assert_eq!(map_pointer(5.0, 5.0, &button, GamePhase::Idle), None);
        assert_eq!(map_pointer(5.0, 5.0, &button, GamePhase::Playing), Some(InputEvent::Jump));
        assert_eq!(map_pointer(cx, cy, &button, GamePhase::Ended), None);
    }
}
