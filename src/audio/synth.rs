//! Instrument slots and offline rendering
//!
//! Slot voices cycle through ten simple patches. The live Web Audio path and
//! the recording renderer share these definitions so an exported take sounds
//! like what was heard.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::MASTER_GAIN;
use crate::sequencer::Trigger;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample at `phase` in [0, 1)
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// ADSR envelope, times in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Envelope {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Short plucky default
    pub const SNAPPY: Envelope = Envelope::new(0.005, 0.08, 0.35, 0.15);

    /// Gain at `t` seconds into a note held for `held` seconds
    pub fn level_at(&self, t: f32, held: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }
        let hold_level = self.held_level(held);
        if t >= held {
            let r = t - held;
            if r >= self.release || self.release <= 0.0 {
                return 0.0;
            }
            return hold_level * (1.0 - r / self.release);
        }
        self.held_level(t)
    }

    fn held_level(&self, t: f32) -> f32 {
        if t < self.attack {
            t / self.attack.max(f32::EPSILON)
        } else if t < self.attack + self.decay {
            let d = (t - self.attack) / self.decay.max(f32::EPSILON);
            1.0 - d * (1.0 - self.sustain)
        } else {
            self.sustain
        }
    }
}

/// What an instrument slot sounds like
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceKind {
    /// Pitched oscillator
    Tone {
        waveform: Waveform,
        envelope: Envelope,
        gain: f32,
    },
    /// Unpitched hit; the note is ignored
    Noise { envelope: Envelope, gain: f32 },
}

impl VoiceKind {
    /// Patch for a slot. Patches repeat every ten slots.
    pub fn for_slot(slot: usize) -> Self {
        let tone = |waveform, envelope, gain| VoiceKind::Tone {
            waveform,
            envelope,
            gain,
        };
        match slot % 10 {
            0 => tone(Waveform::Square, Envelope::SNAPPY, 0.2),
            1 => tone(Waveform::Sine, Envelope::new(0.005, 0.12, 0.2, 0.15), 0.35),
            2 => tone(Waveform::Triangle, Envelope::new(0.005, 0.10, 0.25, 0.18), 0.35),
            3 => tone(Waveform::Sine, Envelope::new(0.001, 0.25, 0.0, 0.05), 0.5),
            4 => tone(Waveform::Square, Envelope::new(0.001, 0.12, 0.0, 0.02), 0.12),
            5 => tone(Waveform::Triangle, Envelope::new(0.001, 0.3, 0.0, 0.1), 0.4),
            6 => tone(Waveform::Sawtooth, Envelope::new(0.01, 0.1, 0.5, 0.2), 0.18),
            7 => tone(Waveform::Sawtooth, Envelope::new(0.005, 0.10, 0.3, 0.12), 0.2),
            8 => tone(Waveform::Square, Envelope::new(0.005, 0.1, 0.4, 0.2), 0.18),
            _ => VoiceKind::Noise {
                envelope: Envelope::new(0.001, 0.08, 0.0, 0.02),
                gain: 0.25,
            },
        }
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            VoiceKind::Tone { envelope, .. } | VoiceKind::Noise { envelope, .. } => *envelope,
        }
    }

    pub fn gain(&self) -> f32 {
        match self {
            VoiceKind::Tone { gain, .. } | VoiceKind::Noise { gain, .. } => *gain,
        }
    }

    pub fn is_percussion(&self) -> bool {
        matches!(self, VoiceKind::Noise { .. })
    }
}

/// Mix triggers into a mono buffer covering `[origin, origin + length)`.
///
/// Triggers before `origin` are skipped; notes ringing past the end are cut.
/// The mix goes through the master gain and a soft clip.
pub fn render_triggers(triggers: &[Trigger], origin: f64, length: f64, sample_rate: u32) -> Vec<f32> {
    let sr = sample_rate as f64;
    let total = (length.max(0.0) * sr).round() as usize;
    let mut buffer = vec![0.0f32; total];

    for (index, trigger) in triggers.iter().enumerate() {
        let offset = trigger.at - origin;
        if offset < 0.0 {
            continue;
        }
        let start = (offset * sr).round() as usize;
        if start >= total {
            continue;
        }

        let voice = VoiceKind::for_slot(trigger.slot);
        let envelope = voice.envelope();
        let held = trigger.duration as f32;
        let ring = ((held + envelope.release) as f64 * sr).ceil() as usize;
        let end = (start + ring).min(total);
        let amplitude = voice.gain() * trigger.velocity;

        let freq = trigger.note.frequency();
        let mut phase = 0.0f32;
        let step = freq / sample_rate as f32;
        let mut noise = Pcg32::seed_from_u64(index as u64);

        for (i, frame) in buffer[start..end].iter_mut().enumerate() {
            let t = i as f32 / sample_rate as f32;
            let level = envelope.level_at(t, held);
            let raw = match voice {
                VoiceKind::Tone { waveform, .. } => {
                    let s = waveform.sample(phase);
                    phase = (phase + step).fract();
                    s
                }
                VoiceKind::Noise { .. } => noise.random_range(-1.0f32..1.0),
            };
            *frame += raw * level * amplitude;
        }
    }

    for frame in &mut buffer {
        *frame = (*frame * MASTER_GAIN).tanh();
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{Lane, Note, Pitch};

    fn trigger(slot: usize, at: f64) -> Trigger {
        Trigger {
            slot,
            lane: Lane::Mid,
            note: Note::new(Pitch::A, 4),
            at,
            duration: 0.25,
            velocity: 1.0,
        }
    }

    #[test]
    fn test_envelope_shape() {
        let env = Envelope::new(0.1, 0.1, 0.5, 0.2);
        assert_eq!(env.level_at(-1.0, 1.0), 0.0);
        assert!((env.level_at(0.05, 1.0) - 0.5).abs() < 1e-5);
        assert!((env.level_at(0.1, 1.0) - 1.0).abs() < 1e-5);
        assert!((env.level_at(0.5, 1.0) - 0.5).abs() < 1e-5);
        // Halfway through release
        assert!((env.level_at(1.1, 1.0) - 0.25).abs() < 1e-5);
        assert_eq!(env.level_at(1.3, 1.0), 0.0);
    }

    #[test]
    fn test_slot_patches_cycle() {
        assert_eq!(VoiceKind::for_slot(3), VoiceKind::for_slot(13));
        assert!(VoiceKind::for_slot(9).is_percussion());
        assert!(VoiceKind::for_slot(29).is_percussion());
        assert!(!VoiceKind::for_slot(0).is_percussion());
    }

    #[test]
    fn test_waveform_ranges() {
        for wave in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle] {
            for i in 0..100 {
                let s = wave.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_render_length_and_silence() {
        let samples = render_triggers(&[], 0.0, 1.0, 8000);
        assert_eq!(samples.len(), 8000);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_render_places_notes_in_time() {
        let samples = render_triggers(&[trigger(0, 0.5)], 0.0, 1.0, 8000);
        // Nothing before the note starts
        assert!(samples[..3990].iter().all(|s| *s == 0.0));
        assert!(samples[4000..5000].iter().any(|s| s.abs() > 0.01));
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_render_skips_out_of_window() {
        let samples = render_triggers(&[trigger(0, -0.1), trigger(9, 2.0)], 0.0, 1.0, 8000);
        assert!(samples.iter().all(|s| *s == 0.0));
    }
}
