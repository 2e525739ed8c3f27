//! Output backends
//!
//! The audio system never talks to a device directly. It asks an
//! `AudioBackend` for voices, one per pool source plus one for the background
//! track, and drives them through the `Voice` trait.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use rodio::source::ChannelVolume;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use super::buffer::SharedBuffer;
use super::session::SessionSettings;
use crate::error::AudioError;

/// Per-playback parameters fixed when a voice starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    /// Playback speed ratio (1.0 = normal pitch)
    pub pitch: f32,

    /// Left-right balance (-1.0 = far left, 1.0 = far right)
    pub pan: f32,

    pub looping: bool,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            pan: 0.0,
            looping: false,
        }
    }
}

/// Connection to an output device
pub trait AudioBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Open an independently controllable playback voice
    fn open_voice(&self) -> Result<Box<dyn Voice>, AudioError>;

    /// Forward platform session options
    fn apply_session(&self, _settings: &SessionSettings) {}
}

/// One playback unit on the device
pub trait Voice: Send {
    /// Replace whatever is playing with `buffer`, from the start
    fn start(&mut self, buffer: SharedBuffer, params: &VoiceParams);

    /// Stop playback and release the buffer. No-op when idle.
    fn stop(&mut self);

    fn set_paused(&mut self, paused: bool);

    /// Effective output gain, already combined with mute and group volume
    fn set_gain(&mut self, gain: f32);

    fn set_looping(&mut self, looping: bool);

    /// True when nothing is queued (never started, stopped or ran out)
    fn is_finished(&self) -> bool;
}

/// Backend playing through the default output device with rodio
///
/// `OutputStream` must stay on the thread that created it, so a dedicated
/// thread owns it until the backend is dropped.
pub struct RodioBackend {
    handle: OutputStreamHandle,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Open the default output device
    pub fn open_default() -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if ready_tx.send(Ok(handle)).is_err() {
                        return;
                    }
                    // Blocks until the backend drops its sender
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;

        let handle = ready_rx
            .recv()
            .map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?
            .map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;

        tracing::info!("Audio output device initialized");

        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &str {
        "rodio"
    }

    fn open_voice(&self) -> Result<Box<dyn Voice>, AudioError> {
        Ok(Box::new(RodioVoice::new(self.handle.clone())?))
    }

    fn apply_session(&self, settings: &SessionSettings) {
        // Desktop outputs have no platform session to configure
        tracing::debug!("Session settings recorded for rodio backend: {:?}", settings);
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A rodio sink plus the state needed to rebuild it after a stop
struct RodioVoice {
    stream_handle: OutputStreamHandle,
    sink: Sink,
    looping: Arc<AtomicBool>,
    gain: f32,
    paused: bool,
}

impl RodioVoice {
    fn new(stream_handle: OutputStreamHandle) -> Result<Self, AudioError> {
        let sink = Sink::try_new(&stream_handle).map_err(|e| AudioError::PlaybackFailed(Box::new(e)))?;
        Ok(Self {
            stream_handle,
            sink,
            looping: Arc::new(AtomicBool::new(false)),
            gain: 1.0,
            paused: false,
        })
    }

    /// Stop the sink and swap in a fresh one so later appends never wait on
    /// the old queue draining.
    fn reset_sink(&mut self) {
        self.sink.stop();
        match Sink::try_new(&self.stream_handle) {
            Ok(sink) => {
                sink.set_volume(self.gain);
                if self.paused {
                    sink.pause();
                }
                self.sink = sink;
            }
            Err(e) => tracing::warn!("Failed to recreate audio sink: {}", e),
        }
    }
}

impl Voice for RodioVoice {
    fn start(&mut self, buffer: SharedBuffer, params: &VoiceParams) {
        if !self.sink.empty() {
            self.reset_sink();
        }

        // A fresh flag per playback so a reclaimed sound stops looping
        self.looping = Arc::new(AtomicBool::new(params.looping));
        let source = BufferSource::new(buffer, Arc::clone(&self.looping));

        let mut boxed_source: Box<dyn Source<Item = f32> + Send> = Box::new(source);

        if (params.pitch - 1.0).abs() > f32::EPSILON && params.pitch > 0.0 {
            boxed_source = Box::new(boxed_source.speed(params.pitch));
        }

        if params.pan.abs() > f32::EPSILON {
            let pan = params.pan.clamp(-1.0, 1.0);
            let left = (1.0 - pan).min(1.0);
            let right = (1.0 + pan).min(1.0);
            boxed_source = Box::new(ChannelVolume::new(boxed_source, vec![left, right]));
        }

        self.sink.set_volume(self.gain);
        self.sink.append(boxed_source);
    }

    fn stop(&mut self) {
        self.looping.store(false, Ordering::Relaxed);
        if !self.sink.empty() {
            self.reset_sink();
        }
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
        self.sink.set_volume(self.gain);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

/// rodio source reading straight out of a shared buffer
///
/// Holds its own `Arc`, so the samples stay alive while the mixer still
/// reads them even if every other holder has let go.
pub struct BufferSource {
    buffer: SharedBuffer,
    position: usize,
    looping: Arc<AtomicBool>,
}

impl BufferSource {
    pub fn new(buffer: SharedBuffer, looping: Arc<AtomicBool>) -> Self {
        Self {
            buffer,
            position: 0,
            looping,
        }
    }
}

impl Iterator for BufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let samples = self.buffer.samples();
        if self.position >= samples.len() {
            if samples.is_empty() || !self.looping.load(Ordering::Relaxed) {
                return None;
            }
            self.position = 0;
        }

        let sample = samples[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for BufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.buffer.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        if self.looping.load(Ordering::Relaxed) {
            None
        } else {
            Some(self.buffer.duration())
        }
    }
}
