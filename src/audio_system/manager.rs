//! Simple audio facade
//!
//! Routes effect calls to the preload cache and channel pool, music calls to
//! the background track, and composes global and per-category mute/pause.
//!
//! Lock order is mix → pool → track. The cache lock is never held while the
//! pool is locked.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{AudioBackend, RodioBackend};
use super::buffer::{SoundLoader, SymphoniaLoader};
use super::cache::PreloadCache;
use super::mix::MixState;
use super::pool::ChannelPool;
use super::session::{SessionEvent, SessionSettings};
use super::source::{PlayParams, SourceHandle, SourceState};
use super::track::{BackgroundTrack, BgPlayRequest};
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Handle to one playing effect.
///
/// Stays valid until its source is stopped or reclaimed for another sound;
/// after that every call is a no-op.
#[derive(Clone)]
pub struct EffectHandle {
    source: SourceHandle,
    pool: Arc<Mutex<ChannelPool>>,
}

impl EffectHandle {
    pub fn id(&self) -> SourceHandle {
        self.source
    }

    pub fn stop(&self) {
        self.pool.lock().stop(self.source);
    }

    pub fn set_paused(&self, paused: bool) {
        self.pool.lock().set_source_paused(self.source, paused);
    }

    pub fn set_looping(&self, looping: bool) {
        self.pool.lock().set_source_looping(self.source, looping);
    }

    pub fn set_volume(&self, volume: f32) {
        self.pool.lock().set_source_volume(self.source, volume);
    }

    pub fn state(&self) -> SourceState {
        self.pool.lock().state(self.source)
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SourceState::Playing
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

pub struct SimpleAudio {
    backend: Arc<dyn AudioBackend>,
    cache: Mutex<PreloadCache>,
    pool: Arc<Mutex<ChannelPool>>,
    track: Mutex<BackgroundTrack>,
    mix: Mutex<MixState>,
    session: Mutex<SessionSettings>,
}

impl SimpleAudio {
    /// Build the audio system on `backend`.
    ///
    /// The background track's voice is opened first. The pool then takes as
    /// many of the requested sources as the backend can still provide.
    pub fn new(
        config: &AudioConfig,
        backend: Arc<dyn AudioBackend>,
        loader: Arc<dyn SoundLoader>,
    ) -> Result<Self, AudioError> {
        config.validate()?;

        let mut track = BackgroundTrack::new(backend.open_voice()?, Arc::clone(&loader));
        track.set_volume(config.bg_volume);

        let mut pool = ChannelPool::new(backend.as_ref(), config.sources)?;
        pool.set_volume(config.effects_volume);

        let cache = PreloadCache::new(loader, config.preload_cache_enabled);
        backend.apply_session(&config.session);

        tracing::info!(
            "Audio system ready on {} with {} effect sources",
            backend.name(),
            pool.size()
        );

        Ok(Self {
            backend,
            cache: Mutex::new(cache),
            pool: Arc::new(Mutex::new(pool)),
            track: Mutex::new(track),
            mix: Mutex::new(MixState::default()),
            session: Mutex::new(config.session),
        })
    }

    /// Build the audio system on the default output device
    pub fn with_default_output(config: &AudioConfig) -> Result<Self, AudioError> {
        let backend: Arc<dyn AudioBackend> = Arc::new(RodioBackend::open_default()?);
        let loader: Arc<dyn SoundLoader> = match &config.asset_root {
            Some(root) => Arc::new(SymphoniaLoader::with_root(root)),
            None => Arc::new(SymphoniaLoader::new()),
        };
        Self::new(config, backend, loader)
    }

    /// Number of sources reserved for effects
    pub fn reserved_sources(&self) -> usize {
        self.pool.lock().size()
    }

    // ============================================
    // Background music
    // ============================================

    /// Load a background track, stopping and releasing the current one.
    pub fn preload_bg(&self, path: impl AsRef<Path>) -> Result<(), AudioError> {
        self.track.lock().preload(path.as_ref())
    }

    /// Play whatever background track is loaded
    pub fn play_bg(&self) -> Result<(), AudioError> {
        self.play_bg_request(BgPlayRequest::current())
    }

    pub fn play_bg_with_loop(&self, looping: bool) -> Result<(), AudioError> {
        self.play_bg_request(BgPlayRequest::current().with_loop(looping))
    }

    /// Play `path`, loading it first if it is not the current track
    pub fn play_bg_file(&self, path: impl AsRef<Path>) -> Result<(), AudioError> {
        self.play_bg_request(BgPlayRequest::file(path.as_ref()))
    }

    pub fn play_bg_file_with_loop(&self, path: impl AsRef<Path>, looping: bool) -> Result<(), AudioError> {
        self.play_bg_request(BgPlayRequest::file(path.as_ref()).with_loop(looping))
    }

    pub fn play_bg_file_with(
        &self,
        path: impl AsRef<Path>,
        volume: f32,
        pan: f32,
        looping: bool,
    ) -> Result<(), AudioError> {
        self.play_bg_request(
            BgPlayRequest::file(path.as_ref())
                .with_volume(volume)
                .with_pan(pan)
                .with_loop(looping),
        )
    }

    pub fn play_bg_request(&self, request: BgPlayRequest) -> Result<(), AudioError> {
        self.track.lock().play(request)
    }

    /// Stop and rewind the background track
    pub fn stop_bg(&self) {
        self.track.lock().stop();
    }

    // ============================================
    // Sound effects
    // ============================================

    /// Decode and cache an effect. Does nothing while the cache is disabled.
    pub fn preload_effect(&self, path: impl AsRef<Path>) -> Result<(), AudioError> {
        self.cache.lock().preload(path.as_ref()).map(|_| ())
    }

    pub fn unload_effect(&self, path: impl AsRef<Path>) {
        self.cache.lock().unload(path.as_ref());
    }

    pub fn unload_all_effects(&self) {
        self.cache.lock().unload_all();
    }

    /// Play an effect at volume 1.0, pitch 1.0, pan 0.0, no loop
    pub fn play_effect(&self, path: impl AsRef<Path>) -> Result<EffectHandle, AudioError> {
        self.play_effect_params(path, PlayParams::default())
    }

    pub fn play_effect_with_loop(&self, path: impl AsRef<Path>, looping: bool) -> Result<EffectHandle, AudioError> {
        self.play_effect_params(path, PlayParams::default().with_loop(looping))
    }

    pub fn play_effect_with(
        &self,
        path: impl AsRef<Path>,
        volume: f32,
        pitch: f32,
        pan: f32,
        looping: bool,
    ) -> Result<EffectHandle, AudioError> {
        self.play_effect_params(
            path,
            PlayParams::default()
                .with_volume(volume)
                .with_pitch(pitch)
                .with_pan(pan)
                .with_loop(looping),
        )
    }

    /// Play an effect on a pool source, loading and caching it if needed.
    ///
    /// Only load failures are reported; a busy pool reclaims its oldest
    /// source instead.
    pub fn play_effect_params(&self, path: impl AsRef<Path>, params: PlayParams) -> Result<EffectHandle, AudioError> {
        let buffer = self.cache.lock().fetch(path.as_ref())?;
        let source = self.pool.lock().play(buffer, params);

        Ok(EffectHandle {
            source,
            pool: Arc::clone(&self.pool),
        })
    }

    pub fn stop_all_effects(&self) {
        self.pool.lock().stop_all();
    }

    /// Stop every effect and the background track. Cached effects stay.
    pub fn stop_everything(&self) {
        self.stop_all_effects();
        self.stop_bg();
    }

    // ============================================
    // Mute / pause
    // ============================================

    pub fn paused(&self) -> bool {
        self.mix.lock().paused
    }

    /// Global pause. Cascades to the effects pool, then the background track.
    pub fn set_paused(&self, paused: bool) {
        self.update_mix(|mix| mix.paused = paused);
    }

    pub fn muted(&self) -> bool {
        self.mix.lock().muted
    }

    /// Global mute. Cascades to the effects pool, then the background track.
    /// Stored volumes are left alone.
    pub fn set_muted(&self, muted: bool) {
        self.update_mix(|mix| mix.muted = muted);
    }

    pub fn effects_paused(&self) -> bool {
        self.mix.lock().effects_paused
    }

    pub fn set_effects_paused(&self, paused: bool) {
        self.update_mix(|mix| mix.effects_paused = paused);
    }

    pub fn effects_muted(&self) -> bool {
        self.mix.lock().effects_muted
    }

    pub fn set_effects_muted(&self, muted: bool) {
        self.update_mix(|mix| mix.effects_muted = muted);
    }

    pub fn bg_paused(&self) -> bool {
        self.mix.lock().bg_paused
    }

    pub fn set_bg_paused(&self, paused: bool) {
        self.update_mix(|mix| mix.bg_paused = paused);
    }

    pub fn bg_muted(&self) -> bool {
        self.mix.lock().bg_muted
    }

    pub fn set_bg_muted(&self, muted: bool) {
        self.update_mix(|mix| mix.bg_muted = muted);
    }

    // ============================================
    // Volume / status
    // ============================================

    pub fn effects_volume(&self) -> f32 {
        self.pool.lock().volume()
    }

    pub fn set_effects_volume(&self, volume: f32) {
        self.pool.lock().set_volume(volume);
    }

    pub fn bg_volume(&self) -> f32 {
        self.track.lock().volume()
    }

    pub fn set_bg_volume(&self, volume: f32) {
        self.track.lock().set_volume(volume);
    }

    /// True while a background track is loaded and playing
    pub fn bg_playing(&self) -> bool {
        self.track.lock().is_playing()
    }

    pub fn preload_cache_enabled(&self) -> bool {
        self.cache.lock().is_enabled()
    }

    /// Disabling the cache also drops everything in it
    pub fn set_preload_cache_enabled(&self, enabled: bool) {
        self.cache.lock().set_enabled(enabled);
    }

    /// Number of distinct cached effects
    pub fn preload_cache_count(&self) -> usize {
        self.cache.lock().len()
    }

    // ============================================
    // Platform session
    // ============================================

    pub fn allow_ipod(&self) -> bool {
        self.session.lock().allow_ipod
    }

    pub fn set_allow_ipod(&self, allow: bool) {
        self.update_session(|session| session.allow_ipod = allow);
    }

    pub fn use_hardware_if_available(&self) -> bool {
        self.session.lock().use_hardware_if_available
    }

    pub fn set_use_hardware_if_available(&self, use_hardware: bool) {
        self.update_session(|session| session.use_hardware_if_available = use_hardware);
    }

    pub fn honor_silent_switch(&self) -> bool {
        self.session.lock().honor_silent_switch
    }

    /// Turning this off lifts a mute forced by the silent switch
    pub fn set_honor_silent_switch(&self, honor: bool) {
        self.update_session(|session| session.honor_silent_switch = honor);
        if !honor {
            self.update_mix(|mix| mix.silenced = false);
        }
    }

    /// React to a signal from the platform audio session
    pub fn handle_session_event(&self, event: SessionEvent) {
        tracing::info!("Audio session event: {:?}", event);
        match event {
            SessionEvent::InterruptionBegan => self.update_mix(|mix| mix.interrupted = true),
            SessionEvent::InterruptionEnded => self.update_mix(|mix| mix.interrupted = false),
            SessionEvent::SilentSwitch { engaged } => {
                let honor = self.honor_silent_switch();
                self.update_mix(|mix| mix.silenced = engaged && honor);
            }
        }
    }

    fn update_session(&self, f: impl FnOnce(&mut SessionSettings)) {
        let settings = {
            let mut session = self.session.lock();
            f(&mut session);
            *session
        };
        self.backend.apply_session(&settings);
    }

    /// Change the mix flags and push the effective state down, pool first
    fn update_mix(&self, f: impl FnOnce(&mut MixState)) {
        let mut mix = self.mix.lock();
        f(&mut mix);

        {
            let mut pool = self.pool.lock();
            pool.set_muted(mix.effective_effects_muted());
            pool.set_paused(mix.effective_effects_paused());
        }

        let mut track = self.track.lock();
        track.set_muted(mix.effective_bg_muted());
        track.set_paused(mix.effective_bg_paused());

        tracing::debug!("Mix state updated: {:?}", *mix);
    }
}

impl fmt::Debug for SimpleAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAudio")
            .field("backend", &self.backend.name())
            .field("mix", &*self.mix.lock())
            .finish_non_exhaustive()
    }
}
