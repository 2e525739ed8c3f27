//! Effect source types
//!
//! Identifies a pool source and describes how a sound plays on it.
use std::fmt;

/// Playback state of one pool source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceState {
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Idle => write!(f, "Idle"),
            SourceState::Playing => write!(f, "Playing"),
            SourceState::Paused => write!(f, "Paused"),
        }
    }
}

/// Identifies a pool source for the lifetime of one playback.
///
/// Once the source is reclaimed for another sound the handle is stale and
/// every operation through it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
}

impl SourceHandle {
    /// Index of the source within the pool
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {}#{}", self.slot, self.generation)
    }
}

/// Parameters for playing an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayParams {
    /// Gain (0.0-1.0)
    pub volume: f32,

    /// 1.0 = normal pitch
    pub pitch: f32,

    /// -1.0 = far left, 1.0 = far right
    pub pan: f32,

    pub looping: bool,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            looping: false,
        }
    }
}

impl PlayParams {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch.max(0.0);
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan.clamp(-1.0, 1.0);
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SourceState::Playing.to_string(), "Playing");
        assert_eq!(SourceState::Idle.to_string(), "Idle");
    }

    #[test]
    fn test_handle_display() {
        let handle = SourceHandle {
            slot: 3,
            generation: 7,
        };
        assert_eq!(handle.to_string(), "source 3#7");
    }

    #[test]
    fn test_play_params_builder() {
        let params = PlayParams::default()
            .with_volume(0.8)
            .with_pitch(1.2)
            .with_pan(-0.3)
            .with_loop(true);

        assert_eq!(params.volume, 0.8);
        assert_eq!(params.pitch, 1.2);
        assert_eq!(params.pan, -0.3);
        assert!(params.looping);
    }

    #[test]
    fn test_play_params_clamping() {
        let params = PlayParams::default().with_volume(1.5).with_pan(-4.0).with_pitch(-1.0);
        assert_eq!(params.volume, 1.0);
        assert_eq!(params.pan, -1.0);
        assert_eq!(params.pitch, 0.0);
    }
}
