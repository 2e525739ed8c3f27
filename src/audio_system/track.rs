//! Background track
//!
//! A single playback slot for music. Only one file is ever current: loading
//! another one stops and releases the previous track first, and a failed load
//! leaves no track loaded.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::{Voice, VoiceParams};
use super::buffer::{SharedBuffer, SoundLoader};
use crate::error::AudioError;

/// Full parameter set for starting background playback.
///
/// Every field is optional; omitted fields keep the track's current values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgPlayRequest {
    pub path: Option<PathBuf>,
    pub volume: Option<f32>,
    pub pan: Option<f32>,
    pub looping: Option<bool>,
}

impl BgPlayRequest {
    /// Play whatever is loaded
    pub fn current() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = Some(pan);
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }
}

pub struct BackgroundTrack {
    voice: Box<dyn Voice>,
    loader: Arc<dyn SoundLoader>,
    buffer: Option<SharedBuffer>,
    started: bool,
    volume: f32,
    pan: f32,
    looping: bool,
    muted: bool,
    paused: bool,
}

impl BackgroundTrack {
    pub fn new(voice: Box<dyn Voice>, loader: Arc<dyn SoundLoader>) -> Self {
        Self {
            voice,
            loader,
            buffer: None,
            started: false,
            volume: 1.0,
            pan: 0.0,
            looping: false,
            muted: false,
            paused: false,
        }
    }

    /// Make `path` the current track without starting it.
    pub fn preload(&mut self, path: &Path) -> Result<(), AudioError> {
        self.stop();
        if let Some(previous) = self.buffer.take() {
            tracing::debug!("Released background track {}", previous.path().display());
        }

        let buffer = self.loader.load(path).map_err(|e| {
            tracing::warn!("Failed to load background track {}: {}", path.display(), e);
            e
        })?;

        tracing::info!(
            "Loaded background track: {} ({:.1}s)",
            path.display(),
            buffer.duration().as_secs_f32()
        );
        self.buffer = Some(Arc::new(buffer));
        Ok(())
    }

    /// Start playback, loading the requested file first if it is not current.
    ///
    /// Calling this while the same track is already playing updates volume
    /// and looping in place without restarting.
    pub fn play(&mut self, request: BgPlayRequest) -> Result<(), AudioError> {
        if let Some(path) = request.path.as_deref() {
            if self.current_path() != Some(path) {
                self.preload(path)?;
            }
        }

        let buffer = self.buffer.clone().ok_or(AudioError::NoTrackLoaded)?;

        if let Some(volume) = request.volume {
            self.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(pan) = request.pan {
            self.pan = pan.clamp(-1.0, 1.0);
        }
        if let Some(looping) = request.looping {
            self.looping = looping;
        }

        if self.is_playing() {
            self.voice.set_gain(self.gain());
            self.voice.set_looping(self.looping);
            return Ok(());
        }

        self.voice.set_paused(self.paused);
        self.voice.set_gain(self.gain());
        self.voice.start(
            Arc::clone(&buffer),
            &VoiceParams {
                pitch: 1.0,
                pan: self.pan,
                looping: self.looping,
            },
        );
        self.started = true;
        tracing::debug!(
            "Playing background track {} (loop: {})",
            buffer.path().display(),
            self.looping
        );
        Ok(())
    }

    /// Stop and rewind. The track stays loaded.
    pub fn stop(&mut self) {
        if self.started {
            self.voice.stop();
            self.started = false;
            tracing::debug!("Stopped background track");
        }
    }

    /// Loaded, started, not stopped, and not run out
    pub fn is_playing(&self) -> bool {
        self.buffer.is_some() && self.started && !self.voice.is_finished()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.buffer.as_ref().map(|buffer| buffer.path())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.voice.set_gain(self.gain());
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.voice.set_gain(self.gain());
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.voice.set_paused(paused);
    }

    fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::backend::AudioBackend;
    use crate::audio_system::headless::NullBackend;
    use crate::audio_system::test_support::FakeLoader;

    fn track() -> (BackgroundTrack, NullBackend) {
        let backend = NullBackend::new();
        let voice = backend.open_voice().unwrap();
        let loader = Arc::new(FakeLoader::new(&["music1", "music2"]));
        (BackgroundTrack::new(voice, loader), backend)
    }

    #[test]
    fn test_play_without_track_fails() {
        let (mut track, _) = track();
        assert!(matches!(
            track.play(BgPlayRequest::current()),
            Err(AudioError::NoTrackLoaded)
        ));
        assert!(!track.is_playing());
    }

    #[test]
    fn test_failed_preload_leaves_no_track() {
        let (mut track, backend) = track();
        track.play(BgPlayRequest::file("music1")).unwrap();
        assert!(track.is_playing());

        assert!(track.preload(Path::new("missing-file")).is_err());
        assert!(!track.is_playing());
        assert!(track.current_path().is_none());
        assert!(!backend.voice(0).unwrap().playing);
    }

    #[test]
    fn test_switching_tracks_stops_previous() {
        let (mut track, backend) = track();
        track.play(BgPlayRequest::file("music1")).unwrap();
        track.play(BgPlayRequest::file("music2")).unwrap();

        let voice = backend.voice(0).unwrap();
        assert_eq!(voice.path, Some(PathBuf::from("music2")));
        assert_eq!(voice.starts, 2);
        assert_eq!(backend.playing_count(), 1);
        assert!(track.is_playing());
    }

    #[test]
    fn test_replay_same_track_updates_in_place() {
        let (mut track, backend) = track();
        track.play(BgPlayRequest::file("music1")).unwrap();
        track
            .play(BgPlayRequest::file("music1").with_volume(0.3).with_loop(true))
            .unwrap();

        let voice = backend.voice(0).unwrap();
        assert_eq!(voice.starts, 1);
        assert_eq!(voice.gain, 0.3);
        assert!(voice.looping);
    }

    #[test]
    fn test_stop_keeps_track_loaded() {
        let (mut track, backend) = track();
        track.preload(Path::new("music1")).unwrap();
        assert!(!track.is_playing());

        track.play(BgPlayRequest::current().with_loop(true)).unwrap();
        track.stop();
        track.stop();

        assert!(!track.is_playing());
        assert_eq!(track.current_path(), Some(Path::new("music1")));

        // Restarts from the beginning with the remembered loop flag
        track.play(BgPlayRequest::current()).unwrap();
        let voice = backend.voice(0).unwrap();
        assert_eq!(voice.starts, 2);
        assert!(voice.looping);
    }

    #[test]
    fn test_track_running_out_is_not_playing() {
        let (mut track, backend) = track();
        track.play(BgPlayRequest::file("music1")).unwrap();
        backend.finish_voice(0);
        assert!(!track.is_playing());
    }

    #[test]
    fn test_mute_restores_volume() {
        let (mut track, backend) = track();
        track
            .play(BgPlayRequest::file("music1").with_volume(0.6).with_pan(0.25))
            .unwrap();
        assert_eq!(backend.voice(0).unwrap().pan, 0.25);

        track.set_muted(true);
        assert_eq!(backend.voice(0).unwrap().gain, 0.0);
        assert_eq!(track.volume(), 0.6);

        track.set_muted(false);
        assert_eq!(backend.voice(0).unwrap().gain, 0.6);
    }
}
