//! Audio voices
//!
//! `synth` describes each instrument slot and renders triggers to PCM for the
//! session recording. On wasm, `web` plays the same triggers live through the
//! Web Audio API and provides the interval clock driving the transport.

use thiserror::Error;

pub mod synth;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use synth::{Envelope, VoiceKind, Waveform, render_triggers};

/// Audio backend failures. None of these stop the game.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to schedule transport: {0}")]
    Schedule(String),
}
