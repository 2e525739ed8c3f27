use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_system::SessionSettings;
use crate::error::ConfigError;

/// Number of sources reserved for effects when nothing else is configured.
pub const DEFAULT_SOURCES: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Number of playback sources reserved for sound effects
    pub sources: usize,

    /// Whether decoded effects are kept in the preload cache
    pub preload_cache_enabled: bool,

    /// Initial effects volume (0.0-1.0)
    pub effects_volume: f32,

    /// Initial background music volume (0.0-1.0)
    pub bg_volume: f32,

    /// Base directory for relative sound paths
    pub asset_root: Option<PathBuf>,

    /// Platform audio session options forwarded to the backend
    pub session: SessionSettings,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES,
            preload_cache_enabled: true,
            effects_volume: 1.0,
            bg_volume: 1.0,
            asset_root: None,
            session: SessionSettings::default(),
        }
    }
}

impl AudioConfig {
    /// Default configuration with a different source count
    pub fn with_sources(sources: usize) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: AudioConfig =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;

        tracing::info!("Loaded audio config from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from disk, creating a default file if none exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }

        let config = AudioConfig::default();
        config.save(path)?;
        tracing::info!("Created default audio config at: {}", path.display());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Platform config location: `<config dir>/SimpleAudio/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("SimpleAudio"))
            .unwrap_or_else(|| PathBuf::from("config"))
            .join("config.json")
    }

    /// Check invariants the audio system relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources == 0 {
            return Err(ConfigError::Invalid(
                "at least one playback source is required".to_string(),
            ));
        }

        for (name, volume) in [("effects_volume", self.effects_volume), ("bg_volume", self.bg_volume)] {
            if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0-1.0, got {}",
                    name, volume
                )));
            }
        }

        Ok(())
    }
}
