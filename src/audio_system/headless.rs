//! Headless backend
//!
//! Plays nothing, but keeps a snapshot of every voice it hands out so the
//! state of the system can be inspected without an audio device (CI, servers,
//! tests). Voices are numbered in the order they were opened.
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{AudioBackend, Voice, VoiceParams};
use super::buffer::SharedBuffer;
use super::session::SessionSettings;
use crate::error::AudioError;

/// Observable state of one headless voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSnapshot {
    /// Path of the buffer being played, if any
    pub path: Option<PathBuf>,
    pub playing: bool,
    pub paused: bool,
    pub gain: f32,
    pub pitch: f32,
    pub pan: f32,
    pub looping: bool,
    /// Number of times the voice was started
    pub starts: usize,
}

impl Default for VoiceSnapshot {
    fn default() -> Self {
        Self {
            path: None,
            playing: false,
            paused: false,
            gain: 1.0,
            pitch: 1.0,
            pan: 0.0,
            looping: false,
            starts: 0,
        }
    }
}

#[derive(Default)]
struct NullVoiceState {
    snapshot: VoiceSnapshot,
    buffer: Option<SharedBuffer>,
}

#[derive(Default)]
pub struct NullBackend {
    voices: Mutex<Vec<Arc<Mutex<NullVoiceState>>>>,
    session: Mutex<Option<SessionSettings>>,
    voice_limit: Option<usize>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses to open more than `limit` voices
    pub fn with_voice_limit(limit: usize) -> Self {
        Self {
            voice_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.lock().len()
    }

    pub fn voice(&self, index: usize) -> Option<VoiceSnapshot> {
        self.voices
            .lock()
            .get(index)
            .map(|voice| voice.lock().snapshot.clone())
    }

    pub fn voices(&self) -> Vec<VoiceSnapshot> {
        self.voices
            .lock()
            .iter()
            .map(|voice| voice.lock().snapshot.clone())
            .collect()
    }

    /// Voices currently holding a buffer
    pub fn playing_count(&self) -> usize {
        self.voices().iter().filter(|v| v.playing).count()
    }

    /// Simulate a non-looping sound running out on its own
    pub fn finish_voice(&self, index: usize) {
        if let Some(voice) = self.voices.lock().get(index) {
            let mut state = voice.lock();
            state.snapshot.playing = false;
            state.buffer = None;
        }
    }

    /// Last settings forwarded through `apply_session`
    pub fn session(&self) -> Option<SessionSettings> {
        *self.session.lock()
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn open_voice(&self) -> Result<Box<dyn Voice>, AudioError> {
        let mut voices = self.voices.lock();
        if let Some(limit) = self.voice_limit {
            if voices.len() >= limit {
                return Err(AudioError::PlaybackFailed(
                    format!("voice limit of {} reached", limit).into(),
                ));
            }
        }

        let state = Arc::new(Mutex::new(NullVoiceState::default()));
        voices.push(Arc::clone(&state));
        Ok(Box::new(NullVoice { state }))
    }

    fn apply_session(&self, settings: &SessionSettings) {
        *self.session.lock() = Some(*settings);
    }
}

struct NullVoice {
    state: Arc<Mutex<NullVoiceState>>,
}

impl Voice for NullVoice {
    fn start(&mut self, buffer: SharedBuffer, params: &VoiceParams) {
        let mut state = self.state.lock();
        state.snapshot.path = Some(buffer.path().to_path_buf());
        state.snapshot.playing = true;
        state.snapshot.pitch = params.pitch;
        state.snapshot.pan = params.pan;
        state.snapshot.looping = params.looping;
        state.snapshot.starts += 1;
        state.buffer = Some(buffer);
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.snapshot.playing = false;
        state.buffer = None;
    }

    fn set_paused(&mut self, paused: bool) {
        self.state.lock().snapshot.paused = paused;
    }

    fn set_gain(&mut self, gain: f32) {
        self.state.lock().snapshot.gain = gain;
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.lock().snapshot.looping = looping;
    }

    fn is_finished(&self) -> bool {
        !self.state.lock().snapshot.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::buffer::DecodedBuffer;

    #[test]
    fn test_voice_records_playback() {
        let backend = NullBackend::new();
        let mut voice = backend.open_voice().unwrap();
        let buffer = Arc::new(DecodedBuffer::new("laser.wav", 1, 8000, vec![0.0; 8]));

        voice.set_gain(0.5);
        voice.start(
            Arc::clone(&buffer),
            &VoiceParams {
                pitch: 1.5,
                pan: -0.5,
                looping: true,
            },
        );

        let snapshot = backend.voice(0).unwrap();
        assert!(snapshot.playing);
        assert_eq!(snapshot.path, Some(PathBuf::from("laser.wav")));
        assert_eq!(snapshot.gain, 0.5);
        assert_eq!(snapshot.pitch, 1.5);
        assert!(snapshot.looping);
        assert_eq!(Arc::strong_count(&buffer), 2);

        voice.stop();
        assert!(voice.is_finished());
        assert_eq!(Arc::strong_count(&buffer), 1);
    }

    #[test]
    fn test_voice_limit() {
        let backend = NullBackend::with_voice_limit(1);
        assert!(backend.open_voice().is_ok());
        assert!(backend.open_voice().is_err());
        assert_eq!(backend.voice_count(), 1);
    }

    #[test]
    fn test_finish_voice() {
        let backend = NullBackend::new();
        let mut voice = backend.open_voice().unwrap();
        voice.start(
            Arc::new(DecodedBuffer::new("a", 1, 8000, vec![0.0])),
            &VoiceParams::default(),
        );
        assert!(!voice.is_finished());

        backend.finish_voice(0);
        assert!(voice.is_finished());
    }
}
