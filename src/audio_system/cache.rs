//! Preload cache
//!
//! Maps a path to a shared decoded buffer. Cache membership and buffer
//! lifetime are independent: removing an entry only drops the cache's own
//! `Arc`, and any voice still playing the buffer keeps it alive.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::buffer::{SharedBuffer, SoundLoader};
use crate::error::AudioError;

struct CacheEntry {
    buffer: SharedBuffer,
    retain_count: usize,
}

pub struct PreloadCache {
    entries: HashMap<PathBuf, CacheEntry>,
    loader: Arc<dyn SoundLoader>,
    enabled: bool,
}

impl PreloadCache {
    pub fn new(loader: Arc<dyn SoundLoader>, enabled: bool) -> Self {
        Self {
            entries: HashMap::new(),
            loader,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable caching. Disabling drops every entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.unload_all();
        }
        tracing::debug!("Preload cache {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Decode `path` once and keep it.
    ///
    /// A repeated preload returns the cached buffer and bumps its retain
    /// count. Returns `Ok(None)` without doing anything while the cache is
    /// disabled. On failure the cache is left untouched.
    pub fn preload(&mut self, path: &Path) -> Result<Option<SharedBuffer>, AudioError> {
        if !self.enabled {
            return Ok(None);
        }

        if let Some(entry) = self.entries.get_mut(path) {
            entry.retain_count += 1;
            return Ok(Some(Arc::clone(&entry.buffer)));
        }

        self.insert(path).map(Some)
    }

    /// Buffer for one playback.
    ///
    /// Cached paths are shared without touching the retain count. Unknown
    /// paths are loaded and cached, or decoded privately when the cache is
    /// disabled.
    pub fn fetch(&mut self, path: &Path) -> Result<SharedBuffer, AudioError> {
        if let Some(entry) = self.entries.get(path) {
            return Ok(Arc::clone(&entry.buffer));
        }

        if self.enabled {
            self.insert(path)
        } else {
            self.decode(path)
        }
    }

    /// Drop the entry for `path` regardless of its retain count.
    pub fn unload(&mut self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }

        match self.entries.remove(path) {
            Some(entry) => {
                tracing::debug!(
                    "Unloaded effect {} (retain count {}, {} other holders)",
                    path.display(),
                    entry.retain_count,
                    Arc::strong_count(&entry.buffer) - 1
                );
                true
            }
            None => false,
        }
    }

    pub fn unload_all(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            tracing::debug!("Unloaded all {} cached effects", count);
        }
    }

    /// Number of distinct cached paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn retain_count(&self, path: &Path) -> Option<usize> {
        self.entries.get(path).map(|entry| entry.retain_count)
    }

    fn insert(&mut self, path: &Path) -> Result<SharedBuffer, AudioError> {
        let buffer = self.decode(path)?;
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                buffer: Arc::clone(&buffer),
                retain_count: 1,
            },
        );
        tracing::info!("Preloaded effect: {} ({} cached)", path.display(), self.entries.len());
        Ok(buffer)
    }

    fn decode(&self, path: &Path) -> Result<SharedBuffer, AudioError> {
        self.loader.load(path).map(Arc::new).map_err(|e| {
            tracing::warn!("Failed to load effect {}: {}", path.display(), e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::test_support::FakeLoader;

    fn cache() -> (PreloadCache, Arc<FakeLoader>) {
        let loader = Arc::new(FakeLoader::new(&["explosion", "laser"]));
        (PreloadCache::new(loader.clone(), true), loader)
    }

    #[test]
    fn test_double_preload_shares_one_entry() {
        let (mut cache, loader) = cache();
        let first = cache.preload(Path::new("explosion")).unwrap().unwrap();
        let second = cache.preload(Path::new("explosion")).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.retain_count(Path::new("explosion")), Some(2));
        assert_eq!(loader.loads(), 1);
    }

    #[test]
    fn test_failed_preload_leaves_cache_unchanged() {
        let (mut cache, _) = cache();
        cache.preload(Path::new("laser")).unwrap();

        let err = cache.preload(Path::new("missing")).unwrap_err();
        assert!(err.is_load_error());
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(Path::new("missing")));
    }

    #[test]
    fn test_unload_keeps_buffer_alive_for_holders() {
        let (mut cache, _) = cache();
        let held = cache.preload(Path::new("explosion")).unwrap().unwrap();
        cache.preload(Path::new("explosion")).unwrap();

        assert!(cache.unload(Path::new("explosion")));
        assert_eq!(cache.len(), 0);
        assert_eq!(Arc::strong_count(&held), 1);
        assert!(!held.samples().is_empty());
        assert!(!cache.unload(Path::new("explosion")));
    }

    #[test]
    fn test_unload_all_empties_cache() {
        let (mut cache, _) = cache();
        cache.preload(Path::new("explosion")).unwrap();
        cache.preload(Path::new("laser")).unwrap();
        cache.unload_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fetch_caches_without_retaining() {
        let (mut cache, loader) = cache();
        cache.fetch(Path::new("laser")).unwrap();
        cache.fetch(Path::new("laser")).unwrap();

        assert_eq!(cache.retain_count(Path::new("laser")), Some(1));
        assert_eq!(loader.loads(), 1);
    }

    #[test]
    fn test_disabled_cache_is_a_no_op() {
        let (mut cache, loader) = cache();
        cache.preload(Path::new("laser")).unwrap();
        cache.set_enabled(false);
        assert_eq!(cache.len(), 0);

        assert!(cache.preload(Path::new("explosion")).unwrap().is_none());
        assert!(!cache.unload(Path::new("explosion")));

        let a = cache.fetch(Path::new("explosion")).unwrap();
        let b = cache.fetch(Path::new("explosion")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 0);
        assert_eq!(loader.loads(), 3);
    }
}
