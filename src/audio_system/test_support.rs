//! Shared fakes for unit tests
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::buffer::{DecodedBuffer, SoundLoader};
use crate::error::AudioError;

/// Loader that knows a fixed set of names and fails on everything else
pub struct FakeLoader {
    known: HashSet<String>,
    loads: AtomicUsize,
}

impl FakeLoader {
    pub fn new(names: &[&str]) -> Self {
        Self {
            known: names.iter().map(|name| name.to_string()).collect(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Successful decodes so far
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl SoundLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<DecodedBuffer, AudioError> {
        let name = path.to_string_lossy();
        if !self.known.contains(name.as_ref()) {
            return Err(AudioError::LoadFailed {
                path: name.into_owned(),
                source: "no such sound".into(),
            });
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(DecodedBuffer::new(path, 1, 8000, vec![0.25; 64]))
    }
}
