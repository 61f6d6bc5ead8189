//! Player preferences
//!
//! Persisted in LocalStorage, separate from gameplay tuning.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sequencer volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
    /// Mute when the tab loses focus
    pub mute_on_blur: bool,

    // === HUD ===
    /// Show the "F for fullscreen" hint on the start screen
    pub show_fullscreen_hint: bool,
    /// Show the step strip under the HUD
    pub show_step_strip: bool,

    /// Let the runner jump on its own
    pub autopilot: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 1.0,
            muted: false,
            mute_on_blur: true,
            show_fullscreen_hint: true,
            show_step_strip: true,
            autopilot: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "music_runner_settings";

    /// Gain applied to the master bus
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.music_volume).clamp(0.0, 1.0)
        }
    }

    /// Volume while the page is hidden or unfocused
    pub fn volume_when_hidden(&self) -> f32 {
        if self.mute_on_blur {
            0.0
        } else {
            self.effective_volume()
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn load() -> Self {
        match storage::load_json(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from storage");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if storage::save_json(Self::STORAGE_KEY, self) {
            log::info!("Settings saved");
        }
    }
}
