//! Mute and pause flags
//!
//! Each category (effects, background) and the whole system carry their own
//! flags. A category is silent or halted when either its own flag or the
//! global one is set. Session signals can force both categories on top of
//! that without touching the user-visible flags.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixState {
    pub muted: bool,
    pub paused: bool,
    pub effects_muted: bool,
    pub effects_paused: bool,
    pub bg_muted: bool,
    pub bg_paused: bool,

    /// Forced pause while the platform session is interrupted
    pub interrupted: bool,

    /// Forced mute while the silent switch is engaged and honored
    pub silenced: bool,
}

impl MixState {
    pub fn effective_effects_muted(&self) -> bool {
        self.muted || self.effects_muted || self.silenced
    }

    pub fn effective_effects_paused(&self) -> bool {
        self.paused || self.effects_paused || self.interrupted
    }

    pub fn effective_bg_muted(&self) -> bool {
        self.muted || self.bg_muted || self.silenced
    }

    pub fn effective_bg_paused(&self) -> bool {
        self.paused || self.bg_paused || self.interrupted
    }
}
