use thiserror::Error;

/// Library errors using thiserror for structured error handling.
///
/// Every fallible operation of the audio system reports one of these through
/// an explicit `Result`. Broadcast and stop operations have no failure path.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode audio format")]
    DecodeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Audio playback failed")]
    PlaybackFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("No background track loaded")]
    NoTrackLoaded,

    #[error("Audio system not initialized")]
    NotInitialized,

    #[error("Audio system already initialized with {existing} sources (requested {requested})")]
    AlreadyInitialized { existing: usize, requested: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AudioError {
    /// True for failures caused by an unreadable or undecodable file.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            AudioError::LoadFailed { .. } | AudioError::DecodeFailed(_) | AudioError::InvalidFormat(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
