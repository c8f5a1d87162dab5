// 💾 Content-addressed caching - Explicit replacement for hidden memoization
// Cache keys are SHA-256 fingerprints of the raw input bytes, never clocks

use crate::error::{PipelineError, PipelineResult};
use crate::gazetteer::{parse_gazetteer, Gazetteer};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

/// Hex SHA-256 fingerprint of raw input bytes, used as the cache key.
/// Same content, same key: a re-read of an unchanged file is a hit.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// CONTENT CACHE
// ============================================================================

/// A small explicit cache keyed by content fingerprint. No TTL and no
/// process-wide state: the owner constructs it, passes it, and decides
/// when to invalidate.
#[derive(Debug, Default)]
pub struct ContentCache<T> {
    entries: HashMap<String, T>,
}

impl<T> ContentCache<T> {
    pub fn new() -> Self {
        ContentCache {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: T) {
        self.entries.insert(key, value);
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// CACHED GAZETTEER LOADER
// ============================================================================

/// Gazetteer loading behind a content-addressed cache. Loading is
/// deterministic for a given file, so a fingerprint hit can skip the
/// JSON parse entirely.
pub struct CachedGazetteerLoader {
    region_code: u32,
    cache: ContentCache<Gazetteer>,
}

impl CachedGazetteerLoader {
    pub fn new(region_code: u32) -> Self {
        CachedGazetteerLoader {
            region_code,
            cache: ContentCache::new(),
        }
    }

    pub fn load(&mut self, path: &Path) -> PipelineResult<Gazetteer> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::not_found(path)
            } else {
                PipelineError::parse(path, e.to_string())
            }
        })?;

        let key = fingerprint(&bytes);

        if let Some(cached) = self.cache.get(&key) {
            debug!("gazetteer cache hit for {}", path.display());
            return Ok(cached.clone());
        }

        let text = String::from_utf8(bytes)
            .map_err(|e| PipelineError::parse(path, e.to_string()))?;
        let records = parse_gazetteer(&text, path)?;
        let gazetteer = Gazetteer::from_records(records, self.region_code);

        self.cache.insert(key, gazetteer.clone());

        Ok(gazetteer)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(b"salvador");
        let b = fingerprint(b"salvador");
        let c = fingerprint(b"feira de santana");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let mut cache: ContentCache<u32> = ContentCache::new();
        let key = fingerprint(b"input");

        assert!(cache.get(&key).is_none());

        cache.insert(key.clone(), 42);
        assert_eq!(cache.get(&key), Some(&42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let mut cache: ContentCache<u32> = ContentCache::new();
        let key = fingerprint(b"input");
        cache.insert(key.clone(), 42);

        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_changed_content_is_a_miss() {
        let mut cache: ContentCache<u32> = ContentCache::new();
        cache.insert(fingerprint(b"version 1"), 1);

        assert!(cache.get(&fingerprint(b"version 2")).is_none());
    }

    #[test]
    fn test_cached_loader_missing_file() {
        let mut loader = CachedGazetteerLoader::new(29);

        let err = loader.load(Path::new("no/such/municipios.json")).unwrap_err();

        assert!(matches!(err, PipelineError::NotFound { .. }));
    }
}
