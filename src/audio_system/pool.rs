//! Channel source pool
//!
//! A fixed arena of voices used for sound effects. `play` takes the
//! lowest-indexed idle source, or steals the source that started earliest
//! when every source is busy, so playing never fails for lack of sources.
use super::backend::{AudioBackend, Voice, VoiceParams};
use super::buffer::SharedBuffer;
use super::source::{PlayParams, SourceHandle, SourceState};
use crate::error::AudioError;

struct Slot {
    voice: Box<dyn Voice>,
    buffer: Option<SharedBuffer>,
    params: PlayParams,
    paused: bool,
    started_at: u64,
    generation: u64,
}

impl Slot {
    fn new(voice: Box<dyn Voice>) -> Self {
        Self {
            voice,
            buffer: None,
            params: PlayParams::default(),
            paused: false,
            started_at: 0,
            generation: 0,
        }
    }

    fn is_busy(&self) -> bool {
        self.buffer.is_some()
    }

    fn release(&mut self) {
        self.voice.stop();
        self.buffer = None;
        self.paused = false;
    }
}

pub struct ChannelPool {
    slots: Vec<Slot>,
    clock: u64,
    volume: f32,
    muted: bool,
    paused: bool,
}

impl ChannelPool {
    /// Open `size` voices on `backend`.
    ///
    /// The size is fixed for the lifetime of the pool. If the backend runs
    /// out of voices part way, the pool keeps what it got.
    pub fn new(backend: &dyn AudioBackend, size: usize) -> Result<Self, AudioError> {
        if size == 0 {
            return Err(crate::error::ConfigError::Invalid(
                "channel pool needs at least one source".to_string(),
            )
            .into());
        }

        let mut slots = Vec::with_capacity(size);
        for i in 0..size {
            match backend.open_voice() {
                Ok(voice) => slots.push(Slot::new(voice)),
                Err(e) if i == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!("Could only open {} of {} sources: {}", i, size, e);
                    break;
                }
            }
        }

        tracing::debug!("Created channel pool with {} sources on {}", slots.len(), backend.name());

        Ok(Self {
            slots,
            clock: 0,
            volume: 1.0,
            muted: false,
            paused: false,
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Sources currently holding a sound
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.is_busy() && !slot.voice.is_finished())
            .count()
    }

    /// Start `buffer` on a source and return its handle.
    pub fn play(&mut self, buffer: SharedBuffer, params: PlayParams) -> SourceHandle {
        self.reap_finished();

        let index = match self.slots.iter().position(|slot| !slot.is_busy()) {
            Some(index) => index,
            None => {
                let index = self.oldest_busy();
                tracing::debug!(
                    "All {} sources busy, reclaiming source {} ({})",
                    self.slots.len(),
                    index,
                    self.slots[index]
                        .buffer
                        .as_ref()
                        .map(|b| b.path().display().to_string())
                        .unwrap_or_default()
                );
                self.slots[index].release();
                index
            }
        };

        self.clock += 1;
        let gain = self.gain_for(params.volume);
        let paused = self.paused;
        let started_at = self.clock;

        let slot = &mut self.slots[index];
        slot.generation += 1;
        slot.started_at = started_at;
        slot.params = params;
        slot.paused = false;

        slot.voice.set_paused(paused);
        slot.voice.set_gain(gain);
        slot.voice.start(
            buffer.clone(),
            &VoiceParams {
                pitch: params.pitch,
                pan: params.pan,
                looping: params.looping,
            },
        );
        tracing::debug!("Playing {} on source {}", buffer.path().display(), index);
        slot.buffer = Some(buffer);

        SourceHandle {
            slot: index,
            generation: slot.generation,
        }
    }

    /// Stop the sound behind `handle`. No-op for stale handles.
    pub fn stop(&mut self, handle: SourceHandle) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.release();
            tracing::debug!("Stopped {}", handle);
        }
    }

    pub fn set_source_paused(&mut self, handle: SourceHandle, paused: bool) {
        let pool_paused = self.paused;
        if let Some(slot) = self.slot_mut(handle) {
            slot.paused = paused;
            slot.voice.set_paused(pool_paused || paused);
        }
    }

    pub fn set_source_looping(&mut self, handle: SourceHandle, looping: bool) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.params.looping = looping;
            slot.voice.set_looping(looping);
        }
    }

    pub fn set_source_volume(&mut self, handle: SourceHandle, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let gain = self.gain_for(volume);
        if let Some(slot) = self.slot_mut(handle) {
            slot.params.volume = volume;
            slot.voice.set_gain(gain);
        }
    }

    pub fn state(&self, handle: SourceHandle) -> SourceState {
        match self.slots.get(handle.slot) {
            Some(slot)
                if slot.generation == handle.generation
                    && slot.is_busy()
                    && !slot.voice.is_finished() =>
            {
                if self.paused || slot.paused {
                    SourceState::Paused
                } else {
                    SourceState::Playing
                }
            }
            _ => SourceState::Idle,
        }
    }

    pub fn stop_all(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_busy()) {
            slot.release();
        }
        tracing::debug!("Stopped all effect sources");
    }

    pub fn pause_all(&mut self) {
        self.set_paused(true);
    }

    pub fn resume_all(&mut self) {
        self.set_paused(false);
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Pool-wide pause, combined with each source's own pause flag
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        for slot in self.slots.iter_mut() {
            slot.voice.set_paused(paused || slot.paused);
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gains();
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_gains();
    }

    fn gain_for(&self, volume: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume * volume
        }
    }

    fn apply_gains(&mut self) {
        let (muted, pool_volume) = (self.muted, self.volume);
        for slot in self.slots.iter_mut() {
            let gain = if muted { 0.0 } else { pool_volume * slot.params.volume };
            slot.voice.set_gain(gain);
        }
    }

    /// Return sources whose sound ran out to the idle set
    fn reap_finished(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.is_busy() && slot.voice.is_finished() {
                slot.buffer = None;
                slot.paused = false;
            }
        }
    }

    /// Busy source with the earliest start; lowest index wins ties
    fn oldest_busy(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_busy())
            .min_by_key(|(index, slot)| (slot.started_at, *index))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    fn slot_mut(&mut self, handle: SourceHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.slot)
            .filter(|slot| slot.generation == handle.generation && slot.is_busy())
    }
}
