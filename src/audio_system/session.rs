//! Platform audio session options and inbound session signals
//!
//! The options are forwarded untouched to the backend. The signals are
//! generated by the platform and may force the system silent or paused.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Let other applications keep playing music alongside ours
    pub allow_ipod: bool,

    /// Prefer hardware decoding when no other application is playing
    pub use_hardware_if_available: bool,

    /// Mute while the platform's silent switch is engaged
    pub honor_silent_switch: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            allow_ipod: true,
            use_hardware_if_available: true,
            honor_silent_switch: true,
        }
    }
}

/// Signals delivered by the platform's audio session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Another audio client took over the output (call, alarm, ...)
    InterruptionBegan,

    /// The interruption is over
    InterruptionEnded,

    /// The ringer/silent switch changed position
    SilentSwitch { engaged: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let settings = SessionSettings::default();
        assert!(settings.allow_ipod);
        assert!(settings.use_hardware_if_available);
        assert!(settings.honor_silent_switch);
    }
}
