//! Session recording
//!
//! While the game runs, every trigger the transport plays is captured. When the
//! game ends the capture is finalized (rendered and WAV-encoded) into an
//! artifact that stays in memory for repeat exports.
//!
//! States: Idle → Capturing → Finalizing → Ready | Unavailable.
//! Export requests are ignored until Ready.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;

use crate::audio::render_triggers;
use crate::consts::SAMPLE_RATE;
use crate::sequencer::Trigger;

/// Download name offered to the player
pub const EXPORT_FILE_NAME: &str = "gameplay_recording.wav";
pub const EXPORT_MIME: &str = "audio/wav";

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("no capture is running")]
    NotCapturing,

    #[error("capture holds no audio")]
    Empty,

    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// Finalized, exportable audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    duration: f64,
    note_count: usize,
}

impl AudioArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Seconds of audio
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn note_count(&self) -> usize {
        self.note_count
    }

    pub fn file_name(&self) -> &'static str {
        EXPORT_FILE_NAME
    }

    pub fn mime(&self) -> &'static str {
        EXPORT_MIME
    }
}

/// Triggers heard between start and stop
#[derive(Debug, Clone)]
pub struct Capture {
    started_at: f64,
    stopped_at: Option<f64>,
    triggers: Vec<Trigger>,
    sample_rate: u32,
}

impl Capture {
    pub fn new(started_at: f64) -> Self {
        Self {
            started_at,
            stopped_at: None,
            triggers: Vec::new(),
            sample_rate: SAMPLE_RATE,
        }
    }

    #[cfg(test)]
    fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn record(&mut self, triggers: &[Trigger]) {
        if self.stopped_at.is_none() {
            self.triggers.extend_from_slice(triggers);
        }
    }

    pub fn stop(&mut self, at: f64) {
        self.stopped_at.get_or_insert(at);
    }

    /// Captured length in seconds (up to now if still running)
    pub fn duration(&self) -> f64 {
        self.stopped_at
            .map(|end| (end - self.started_at).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn note_count(&self) -> usize {
        self.triggers.len()
    }

    /// Render and encode. Consumes the capture.
    pub fn finalize(self) -> Result<AudioArtifact, RecordingError> {
        let duration = self.duration();
        if duration <= 0.0 {
            return Err(RecordingError::Empty);
        }
        let samples = render_triggers(&self.triggers, self.started_at, duration, self.sample_rate);
        let bytes = encode_wav(&samples, self.sample_rate)?;
        Ok(AudioArtifact {
            bytes,
            duration,
            note_count: self.triggers.len(),
        })
    }
}

/// 16-bit mono WAV in memory
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(pcm)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Recording lifecycle as seen from the end screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    Idle,
    Capturing,
    Finalizing,
    Ready,
    Unavailable,
}

impl RecordingStatus {
    /// End-screen prompt
    pub fn prompt(&self) -> &'static str {
        match self {
            RecordingStatus::Finalizing => "FINALIZING...",
            RecordingStatus::Ready => "PRESS E TO EXPORT",
            RecordingStatus::Idle | RecordingStatus::Capturing | RecordingStatus::Unavailable => {
                "NO AUDIO RECORDED"
            }
        }
    }
}

#[derive(Debug, Default)]
enum RecordingState {
    #[default]
    Idle,
    Capturing(Capture),
    Finalizing,
    Ready(AudioArtifact),
    Unavailable,
}

/// Owns the capture and, later, the finished artifact
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: RecordingState,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RecordingStatus {
        match self.state {
            RecordingState::Idle => RecordingStatus::Idle,
            RecordingState::Capturing(_) => RecordingStatus::Capturing,
            RecordingState::Finalizing => RecordingStatus::Finalizing,
            RecordingState::Ready(_) => RecordingStatus::Ready,
            RecordingState::Unavailable => RecordingStatus::Unavailable,
        }
    }

    pub fn is_finalizing(&self) -> bool {
        matches!(self.state, RecordingState::Finalizing)
    }

    /// Begin capturing. Only valid once, from Idle.
    pub fn start(&mut self, at: f64) {
        if matches!(self.state, RecordingState::Idle) {
            self.state = RecordingState::Capturing(Capture::new(at));
            log::info!("Recording started");
        }
    }

    pub fn record(&mut self, triggers: &[Trigger]) {
        if let RecordingState::Capturing(capture) = &mut self.state {
            capture.record(triggers);
        }
    }

    /// Stop capturing and hand the capture out for finalization.
    ///
    /// Returns `None` when there is nothing to finalize: never started (the
    /// session becomes Unavailable) or already finalizing/finalized.
    pub fn begin_finalize(&mut self, at: f64) -> Option<Capture> {
        match std::mem::take(&mut self.state) {
            RecordingState::Capturing(mut capture) => {
                capture.stop(at);
                self.state = RecordingState::Finalizing;
                log::info!(
                    "Finalizing recording ({:.1}s, {} notes)",
                    capture.duration(),
                    capture.note_count()
                );
                Some(capture)
            }
            RecordingState::Idle => {
                log::warn!("Game ended without an audio capture");
                self.state = RecordingState::Unavailable;
                None
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Store the finalization result. Ignored unless Finalizing.
    pub fn complete(&mut self, result: Result<AudioArtifact, RecordingError>) {
        if !self.is_finalizing() {
            return;
        }
        self.state = match result {
            Ok(artifact) => {
                log::info!(
                    "Recording ready: {} bytes, {:.1}s",
                    artifact.bytes().len(),
                    artifact.duration()
                );
                RecordingState::Ready(artifact)
            }
            Err(e) => {
                log::warn!("Recording finalization failed: {}", e);
                RecordingState::Unavailable
            }
        };
    }

    /// The finished artifact, or `None` while pending or unavailable
    pub fn export(&self) -> Option<&AudioArtifact> {
        match &self.state {
            RecordingState::Ready(artifact) => Some(artifact),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{Lane, Note, Pitch};

    fn trigger(at: f64) -> Trigger {
        Trigger {
            slot: 1,
            lane: Lane::Low,
            note: Note::new(Pitch::C, 3),
            at,
            duration: 0.125,
            velocity: 0.7,
        }
    }

    #[test]
    fn test_wav_header() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5, 1.0], 8000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 4 samples * 2 bytes
        assert_eq!(bytes.len(), 44 + 8);
    }

    #[test]
    fn test_capture_finalizes_to_wav() {
        let mut capture = Capture::new(10.0).with_sample_rate(8000);
        capture.record(&[trigger(10.1), trigger(10.6)]);
        capture.stop(11.0);
        // Recording after stop is ignored
        capture.record(&[trigger(10.9)]);

        let artifact = capture.finalize().unwrap();
        assert_eq!(artifact.note_count(), 2);
        assert!((artifact.duration() - 1.0).abs() < 1e-9);
        assert_eq!(artifact.bytes().len(), 44 + 8000 * 2);
        assert_eq!(artifact.file_name(), "gameplay_recording.wav");
    }

    #[test]
    fn test_empty_capture_fails() {
        let mut capture = Capture::new(5.0);
        capture.stop(5.0);
        assert!(matches!(capture.finalize(), Err(RecordingError::Empty)));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = RecordingSession::new();
        assert_eq!(session.status(), RecordingStatus::Idle);

        session.start(0.0);
        session.record(&[trigger(0.2)]);
        assert_eq!(session.status(), RecordingStatus::Capturing);
        assert!(session.export().is_none());

        let capture = session.begin_finalize(1.0).unwrap();
        assert_eq!(session.status(), RecordingStatus::Finalizing);
        assert_eq!(session.status().prompt(), "FINALIZING...");
        // Export while pending is dropped, second finalize is a no-op
        assert!(session.export().is_none());
        assert!(session.begin_finalize(2.0).is_none());

        session.complete(capture.with_sample_rate(8000).finalize());
        assert_eq!(session.status(), RecordingStatus::Ready);

        let first = session.export().unwrap().clone();
        let second = session.export().unwrap();
        assert_eq!(&first, second);
        assert_eq!(session.status().prompt(), "PRESS E TO EXPORT");
    }

    #[test]
    fn test_session_without_capture_is_unavailable() {
        let mut session = RecordingSession::new();
        assert!(session.begin_finalize(1.0).is_none());
        assert_eq!(session.status(), RecordingStatus::Unavailable);
        assert_eq!(session.status().prompt(), "NO AUDIO RECORDED");
    }

    #[test]
    fn test_failed_finalize_is_unavailable() {
        let mut session = RecordingSession::new();
        session.start(0.0);
        session.begin_finalize(0.0);
        session.complete(Err(RecordingError::Empty));
        assert_eq!(session.status(), RecordingStatus::Unavailable);
        assert!(session.export().is_none());
    }

    #[test]
    fn test_complete_ignored_when_not_finalizing() {
        let mut session = RecordingSession::new();
        session.complete(Err(RecordingError::NotCapturing));
        assert_eq!(session.status(), RecordingStatus::Idle);
    }
}
