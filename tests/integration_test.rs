// Integration tests for simple-audio
// These run the full facade headless on the null backend

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use simple_audio::audio_system::{DecodedBuffer, NullBackend};
use simple_audio::{AudioConfig, AudioError, SimpleAudio, SoundLoader, SourceState, SymphoniaLoader};

/// Loader that produces a short silent buffer for known names
struct NamedLoader {
    known: HashSet<&'static str>,
}

impl SoundLoader for NamedLoader {
    fn load(&self, path: &Path) -> Result<DecodedBuffer, AudioError> {
        let name = path.to_string_lossy();
        if self.known.contains(name.as_ref()) {
            Ok(DecodedBuffer::new(path, 2, 44_100, vec![0.0; 256]))
        } else {
            Err(AudioError::LoadFailed {
                path: name.into_owned(),
                source: "not found".into(),
            })
        }
    }
}

fn system(sources: usize) -> (SimpleAudio, Arc<NullBackend>) {
    let backend = Arc::new(NullBackend::new());
    let loader = NamedLoader {
        known: ["explosion", "A", "B", "C", "music1", "music2"].into_iter().collect(),
    };
    let audio = SimpleAudio::new(&AudioConfig::with_sources(sources), backend.clone(), Arc::new(loader))
        .expect("audio system should build on the null backend");
    (audio, backend)
}

#[test]
fn test_preload_then_play_effect() {
    let (audio, _) = system(16);

    audio.preload_effect("explosion").unwrap();
    let handle = audio.play_effect("explosion").unwrap();

    assert!(handle.is_playing());
    assert_eq!(audio.preload_cache_count(), 1);
}

#[test]
fn test_unload_during_playback_keeps_playing() {
    let (audio, backend) = system(16);

    audio.preload_effect("explosion").unwrap();
    let handle = audio.play_effect("explosion").unwrap();
    audio.unload_effect("explosion");

    assert_eq!(audio.preload_cache_count(), 0);
    assert!(handle.is_playing());
    let voice = backend.voice(handle.id().slot() + 1).unwrap();
    assert!(voice.playing);
    assert_eq!(voice.path, Some(PathBuf::from("explosion")));
}

#[test]
fn test_switching_background_tracks() {
    let (audio, backend) = system(4);

    audio.play_bg_file("music1").unwrap();
    audio.play_bg_file("music2").unwrap();

    assert!(audio.bg_playing());
    // Background voice is opened before the pool voices
    let voice = backend.voice(0).unwrap();
    assert_eq!(voice.path, Some(PathBuf::from("music2")));
    assert_eq!(backend.playing_count(), 1);
}

#[test]
fn test_single_source_pool_reclaims() {
    let (audio, backend) = system(1);

    let a = audio.play_effect("A").unwrap();
    let b = audio.play_effect("B").unwrap();

    assert_eq!(a.id().slot(), b.id().slot());
    assert_eq!(a.state(), SourceState::Idle);
    assert!(b.is_playing());
    assert_eq!(backend.voice(1).unwrap().path, Some(PathBuf::from("B")));

    // Stale handle must not touch B
    a.stop();
    assert!(b.is_playing());

    audio.stop_all_effects();
    assert_eq!(b.state(), SourceState::Idle);
    assert_eq!(backend.playing_count(), 0);
}

#[test]
fn test_missing_background_file() {
    let (audio, _) = system(4);

    let result = audio.preload_bg("missing-file");

    assert!(result.unwrap_err().is_load_error());
    assert!(!audio.bg_playing());
}

#[test]
fn test_failed_bg_load_drops_previous_track() {
    let (audio, _) = system(4);
    audio.play_bg_file("music1").unwrap();

    assert!(audio.play_bg_file("missing-file").is_err());
    assert!(!audio.bg_playing());
    assert!(matches!(audio.play_bg(), Err(AudioError::NoTrackLoaded)));
}

#[test]
fn test_full_pool_always_returns_handle() {
    let sources = 3;
    let (audio, backend) = system(sources);

    let handles: Vec<_> = ["A", "B", "C"]
        .iter()
        .map(|name| audio.play_effect(name).unwrap())
        .collect();

    let extra = audio.play_effect("explosion").unwrap();

    // Only the earliest source was reclaimed
    assert_eq!(extra.id().slot(), handles[0].id().slot());
    assert_eq!(handles[0].state(), SourceState::Idle);
    assert!(handles[1].is_playing());
    assert!(handles[2].is_playing());
    assert_eq!(backend.playing_count(), sources);
}

#[test]
fn test_unload_all_empties_cache() {
    let (audio, _) = system(4);
    audio.preload_effect("A").unwrap();
    audio.preload_effect("B").unwrap();
    audio.preload_effect("A").unwrap();
    assert_eq!(audio.preload_cache_count(), 2);

    audio.unload_all_effects();
    assert_eq!(audio.preload_cache_count(), 0);
}

#[test]
fn test_mute_restores_stored_volume() {
    let (audio, backend) = system(2);
    audio.set_effects_volume(0.5);
    audio.set_bg_volume(0.25);
    audio.play_effect("A").unwrap();
    audio.play_bg_file("music1").unwrap();

    audio.set_muted(true);
    assert_eq!(audio.effects_volume(), 0.5);
    assert_eq!(audio.bg_volume(), 0.25);
    assert!(backend.voices().iter().all(|v| v.gain == 0.0));

    audio.set_muted(false);
    assert_eq!(backend.voice(1).unwrap().gain, 0.5);
    assert_eq!(backend.voice(0).unwrap().gain, 0.25);
}

#[test]
fn test_decodes_real_wav_file() {
    let dir = std::env::temp_dir().join(format!("simple-audio-wav-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("beep.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..800 {
        let t = i as f32 / 8_000.0;
        let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
        writer.write_sample((sample * i16::MAX as f32 * 0.5) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let backend = Arc::new(NullBackend::new());
    let audio = SimpleAudio::new(
        &AudioConfig::with_sources(2),
        backend.clone(),
        Arc::new(SymphoniaLoader::with_root(&dir)),
    )
    .unwrap();

    audio.preload_effect("beep.wav").unwrap();
    let handle = audio.play_effect("beep.wav").unwrap();

    let decoded = SymphoniaLoader::new().load(&path).unwrap();
    let _ = std::fs::remove_dir_all(&dir);

    assert!(handle.is_playing());
    assert_eq!(audio.preload_cache_count(), 1);
    assert_eq!(decoded.channels(), 1);
    assert_eq!(decoded.sample_rate(), 8_000);
    assert_eq!(decoded.frames(), 800);
    assert!(decoded.samples().iter().all(|s| s.abs() <= 1.0));
}
