//! Live playback through the Web Audio API
//!
//! `AudioManager` turns transport triggers into oscillator notes. The
//! `IntervalClock` is a browser timer feeding the transport channel.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::AudioError;
use super::synth::{VoiceKind, Waveform};
use crate::consts::MASTER_GAIN;
use crate::sequencer::{ClockTick, Scheduler, Trigger};

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

/// Audio manager for the live mix
pub struct AudioManager {
    ctx: AudioContext,
    master: GainNode,
    volume: f32,
}

impl AudioManager {
    /// Create the context and master bus. Fails outside a secure context or
    /// before the page allows audio.
    pub fn new(volume: f32) -> Result<Self, AudioError> {
        let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(format!("{e:?}")))?;
        let master = ctx
            .create_gain()
            .map_err(|e| AudioError::Unavailable(format!("{e:?}")))?;
        master
            .connect_with_audio_node(&ctx.destination())
            .map_err(|e| AudioError::Unavailable(format!("{e:?}")))?;
        let mut manager = Self {
            ctx,
            master,
            volume: 1.0,
        };
        manager.set_volume(volume);
        Ok(manager)
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if self.ctx.state() == web_sys::AudioContextState::Suspended {
            if let Err(e) = self.ctx.resume() {
                log::warn!("AudioContext resume failed: {:?}", e);
            }
        }
    }

    /// Audio-clock time in seconds
    pub fn now(&self) -> f64 {
        self.ctx.current_time()
    }

    /// Set output volume (0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.master.gain().set_value(self.volume * MASTER_GAIN);
    }

    /// Schedule one trigger
    pub fn play(&self, trigger: &Trigger) {
        if self.volume <= 0.0 {
            return;
        }
        let voice = VoiceKind::for_slot(trigger.slot);
        let envelope = voice.envelope();
        let (waveform, freq) = match voice {
            VoiceKind::Tone { waveform, .. } => (waveform, trigger.note.frequency()),
            // Short high square burst stands in for noise
            VoiceKind::Noise { .. } => (Waveform::Square, 4000.0),
        };
        let Some((osc, gain)) = self.create_osc(freq, oscillator_type(waveform)) else {
            return;
        };

        let t = trigger.at.max(self.ctx.current_time());
        let peak = voice.gain() * trigger.velocity;
        let attack = envelope.attack as f64;
        let decay = envelope.decay as f64;
        let held = trigger.duration;
        let end = t + held + envelope.release as f64;

        gain.gain().set_value_at_time(0.0, t).ok();
        gain.gain().linear_ramp_to_value_at_time(peak, t + attack).ok();
        gain.gain()
            .linear_ramp_to_value_at_time((peak * envelope.sustain).max(0.0001), t + attack + decay)
            .ok();
        gain.gain().set_value_at_time((peak * envelope.sustain).max(0.0001), t + held).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.0001, end).ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(end + 0.01).ok();
    }

    /// Create an oscillator with gain envelope routed to the master bus
    fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
        let osc = self.ctx.create_oscillator().ok()?;
        let gain = self.ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&self.master).ok()?;

        Some((osc, gain))
    }
}

/// Browser interval timer emitting transport ticks
#[derive(Default)]
pub struct IntervalClock {
    handle: Option<i32>,
    callback: Option<Closure<dyn FnMut()>>,
}

impl IntervalClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for IntervalClock {
    fn start(
        &mut self,
        interval: f64,
        first_at: f64,
        ticks: Sender<ClockTick>,
    ) -> Result<(), AudioError> {
        self.stop();
        let window = web_sys::window().ok_or_else(|| AudioError::Schedule("no window".into()))?;

        // setInterval first fires one interval after registration
        let count = Rc::new(Cell::new(1u64));
        let callback = Closure::<dyn FnMut()>::new(move || {
            let n = count.get();
            count.set(n + 1);
            // Receiver gone means the session ended; the timer is cleared on stop
            let _ = ticks.send(ClockTick {
                at: first_at + n as f64 * interval,
            });
        });

        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                (interval * 1000.0).round() as i32,
            )
            .map_err(|e| AudioError::Schedule(format!("{e:?}")))?;

        self.handle = Some(handle);
        self.callback = Some(callback);
        Ok(())
    }

    fn stop(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_interval_with_handle(handle);
        }
        self.callback = None;
    }
}
