//! Process-wide audio context
//!
//! The audio system is built once at startup. Later calls asking for the same
//! number of sources get the existing instance; asking for a different number
//! is an error because the pool size can never change.
//!
//! Calls are compared by the source count they *request*. A backend short of
//! voices may leave `reserved_sources()` below that count, and repeating the
//! original request still returns the existing instance.
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::backend::AudioBackend;
use super::buffer::SoundLoader;
use super::manager::SimpleAudio;
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Requested source count (not `reserved_sources`) alongside the system built for it
static SHARED: OnceLock<(usize, Arc<SimpleAudio>)> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Initialize the shared audio system on the default output device.
pub fn initialize(config: &AudioConfig) -> Result<Arc<SimpleAudio>, AudioError> {
    initialize_inner(config, || SimpleAudio::with_default_output(config))
}

/// Initialize the shared audio system on a specific backend.
///
/// If the system already exists, `backend` and `loader` are dropped unused.
pub fn initialize_with(
    config: &AudioConfig,
    backend: Arc<dyn AudioBackend>,
    loader: Arc<dyn SoundLoader>,
) -> Result<Arc<SimpleAudio>, AudioError> {
    initialize_inner(config, || SimpleAudio::new(config, backend, loader))
}

/// The shared audio system, if it has been initialized
pub fn shared() -> Result<Arc<SimpleAudio>, AudioError> {
    SHARED
        .get()
        .map(|(_, system)| Arc::clone(system))
        .ok_or(AudioError::NotInitialized)
}

pub fn is_initialized() -> bool {
    SHARED.get().is_some()
}

fn initialize_inner<F>(config: &AudioConfig, build: F) -> Result<Arc<SimpleAudio>, AudioError>
where
    F: FnOnce() -> Result<SimpleAudio, AudioError>,
{
    let _guard = INIT_LOCK.lock();

    if let Some((sources, existing)) = SHARED.get() {
        if *sources != config.sources {
            return Err(AudioError::AlreadyInitialized {
                existing: *sources,
                requested: config.sources,
            });
        }
        tracing::debug!("Audio system already initialized, reusing it");
        return Ok(Arc::clone(existing));
    }

    let system = Arc::new(build()?);
    let _ = SHARED.set((config.sources, Arc::clone(&system)));
    Ok(system)
}
