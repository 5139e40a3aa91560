//! Bounded cache of translation results shared by concurrent image tasks.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Number of entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

/// Cache key: image content hash plus target language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hex digest of the encoded image bytes, see [`content_hash`].
    pub content_hash: String,
    /// Target language the text was translated into.
    pub target_language: String,
}

impl CacheKey {
    /// Build a key.
    pub fn new(content_hash: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            target_language: target_language.into(),
        }
    }
}

/// MD5 hex digest of an encoded image.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

#[derive(Default)]
struct Entries {
    map: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

/// Insertion-ordered cache of translated text; evicts the oldest entry once
/// full. Overwriting a key keeps its original position.
///
/// Safe to share between threads; every access takes one short lock.
pub struct TranslationCache {
    entries: Mutex<Entries>,
    capacity: usize,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl TranslationCache {
    /// Create a cache holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Cached translation for `key`.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = entries.map.get(key).cloned();
        if hit.is_some() {
            debug!(hash = %key.content_hash, lang = %key.target_language, "cache hit");
        }
        hit
    }

    /// Store a translation, evicting the oldest entries beyond capacity.
    pub fn insert(&self, key: CacheKey, text: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.map.get_mut(&key) {
            *existing = text;
            return;
        }
        entries.order.push_back(key.clone());
        entries.map.insert(key, text);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
            }
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> CacheKey {
        CacheKey::new(format!("hash{i}"), "Arabic")
    }

    #[test]
    fn inserting_past_capacity_evicts_oldest_only() {
        let cache = TranslationCache::default();
        for i in 0..50 {
            cache.insert(key(i), format!("text{i}"));
        }
        assert_eq!(cache.len(), 50);

        cache.insert(key(50), "text50".into());
        assert_eq!(cache.len(), 50);
        assert_eq!(cache.get(&key(0)), None);
        for i in 1..=50 {
            assert_eq!(cache.get(&key(i)), Some(format!("text{i}")));
        }
    }

    #[test]
    fn overwrite_keeps_position() {
        let cache = TranslationCache::new(2);
        cache.insert(key(0), "a".into());
        cache.insert(key(1), "b".into());
        cache.insert(key(0), "a2".into());
        cache.insert(key(2), "c".into());

        assert_eq!(cache.get(&key(0)), None, "key 0 was still the oldest");
        assert_eq!(cache.get(&key(1)), Some("b".into()));
        assert_eq!(cache.get(&key(2)), Some("c".into()));
    }

    #[test]
    fn language_is_part_of_the_key() {
        let cache = TranslationCache::default();
        cache.insert(CacheKey::new("h", "Arabic"), "ar".into());
        assert_eq!(cache.get(&CacheKey::new("h", "English")), None);
        assert_eq!(cache.get(&CacheKey::new("h", "Arabic")), Some("ar".into()));
    }

    #[test]
    fn content_hash_is_stable_hex() {
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    #[test]
    fn concurrent_inserts_respect_capacity() {
        let cache = TranslationCache::new(10);
        std::thread::scope(|s| {
            for t in 0..4 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..25 {
                        cache.insert(key(t * 100 + i), "x".into());
                    }
                });
            }
        });
        assert_eq!(cache.len(), 10);
    }
}
