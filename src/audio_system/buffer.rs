//! Decoded audio buffers and the loaders that produce them
//!
//! A `DecodedBuffer` is immutable once decoded and shared through `Arc`, so the
//! preload cache, pool voices and the background track can all hold the same
//! samples. The buffer is freed when the last holder drops it.
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Reference-counted handle to decoded audio.
pub type SharedBuffer = Arc<DecodedBuffer>;

/// Interleaved f32 samples decoded from a single file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    path: PathBuf,
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl DecodedBuffer {
    pub fn new(path: impl Into<PathBuf>, channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            path: path.into(),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
            samples,
        }
    }

    /// Path the samples were decoded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn size_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

/// Turns a path into decoded audio.
///
/// Loading is synchronous and may block on file I/O.
pub trait SoundLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<DecodedBuffer, AudioError>;
}

/// Loader backed by symphonia's probe and codec registry
#[derive(Debug, Clone, Default)]
pub struct SymphoniaLoader {
    root: Option<PathBuf>,
}

impl SymphoniaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SoundLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> Result<DecodedBuffer, AudioError> {
        let full_path = self.resolve(path);

        let src = File::open(&full_path).map_err(|e| AudioError::LoadFailed {
            path: full_path.display().to_string(),
            source: Box::new(e),
        })?;
        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        // Create a probe hint using the file extension
        let mut hint = Hint::new();
        if let Some(ext) = full_path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| match e {
                SymphoniaError::Unsupported(what) => {
                    AudioError::InvalidFormat(format!("{}: {}", full_path.display(), what))
                }
                other => AudioError::DecodeFailed(Box::new(other)),
            })?;
        let mut format = probed.format;

        // Find the first audio track with a known (decodable) codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                AudioError::InvalidFormat(format!("{}: no supported audio tracks", full_path.display()))
            })?;

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &dec_opts)
            .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;

        let track_id = track.id;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
        let mut sample_rate = track.codec_params.sample_rate;
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                // Track list changed mid-stream; keep what was decoded so far
                Err(SymphoniaError::ResetRequired) => break,
                Err(SymphoniaError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(err) => return Err(AudioError::DecodeFailed(Box::new(err))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels.get_or_insert(spec.channels.count() as u16);
                    sample_rate.get_or_insert(spec.rate);

                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                // Skip packets that fail on bad data
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
                Err(err) => return Err(AudioError::DecodeFailed(Box::new(err))),
            }
        }

        let (channels, sample_rate) = match (channels, sample_rate) {
            (Some(channels), Some(rate)) if !samples.is_empty() => (channels, rate),
            _ => {
                return Err(AudioError::InvalidFormat(format!(
                    "{}: no decodable audio",
                    full_path.display()
                )))
            }
        };

        let buffer = DecodedBuffer::new(path, channels, sample_rate, samples);
        tracing::debug!(
            "Decoded {} ({} ch, {} Hz, {:.2}s, {} bytes)",
            full_path.display(),
            buffer.channels(),
            buffer.sample_rate(),
            buffer.duration().as_secs_f32(),
            buffer.size_bytes()
        );
        Ok(buffer)
    }
}
