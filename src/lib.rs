pub mod audio_system;
pub mod config;
pub mod error;

pub use audio_system::context;
pub use audio_system::{
    AudioBackend, BgPlayRequest, EffectHandle, NullBackend, PlayParams, SessionEvent,
    SessionSettings, SimpleAudio, SoundLoader, SourceState, SymphoniaLoader,
};
pub use config::AudioConfig;
pub use error::{AudioError, ConfigError};
