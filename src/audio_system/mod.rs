//! Audio system module
//!
//! A simple facade over an output backend offering:
//! - Sound effects multiplexed over a fixed pool of interruptible sources
//! - A single background music slot
//! - A preload cache of decoded effects shared by reference
//! - Global and per-category mute/pause
//!
//! ## Architecture
//!
//! ```text
//! SimpleAudio
//!   ├── PreloadCache ── path → Arc<DecodedBuffer> ─┐
//!   ├── ChannelPool                                 │ shared
//!   │     └── Voice[0..N]  (oldest-first stealing) ◄┘ buffers
//!   ├── BackgroundTrack
//!   │     └── Voice        (one file at a time)
//!   └── MixState           (global OR category)
//!
//! AudioBackend ── RodioBackend | NullBackend
//! SoundLoader  ── SymphoniaLoader
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use simple_audio::{context, AudioConfig};
//!
//! let audio = context::initialize(&AudioConfig::with_sources(16))?;
//!
//! audio.preload_effect("explosion.wav")?;
//! let boom = audio.play_effect("explosion.wav")?;
//!
//! audio.play_bg_file_with_loop("music.ogg", true)?;
//!
//! // Silences everything without touching stored volumes
//! audio.set_muted(true);
//! # Ok::<(), simple_audio::AudioError>(())
//! ```

pub mod backend;
pub mod buffer;
pub mod cache;
pub mod context;
pub mod headless;
pub mod manager;
pub mod mix;
pub mod pool;
pub mod session;
pub mod source;
pub mod track;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use backend::{AudioBackend, RodioBackend, Voice, VoiceParams};
pub use buffer::{DecodedBuffer, SharedBuffer, SoundLoader, SymphoniaLoader};
pub use cache::PreloadCache;
pub use headless::{NullBackend, VoiceSnapshot};
pub use manager::{EffectHandle, SimpleAudio};
pub use mix::MixState;
pub use pool::ChannelPool;
pub use session::{SessionEvent, SessionSettings};
pub use source::{PlayParams, SourceHandle, SourceState};
pub use track::{BackgroundTrack, BgPlayRequest};
