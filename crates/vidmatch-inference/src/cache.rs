//! Process-wide embedding cache keyed by a text prefix.
//!
//! Eviction is strictly first-in-first-out: the oldest *inserted* key goes
//! first and reads never refresh an entry's position. It is not an LRU.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use vidmatch_core::{defaults, Embedding};

/// Build the cache key: the first `key_chars` characters of `text`.
pub fn cache_key(text: &str, key_chars: usize) -> String {
    text.chars().take(key_chars).collect()
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Embedding>,
    /// Keys in first-insertion order.
    order: VecDeque<String>,
    stats: CacheStats,
}

/// Bounded FIFO cache from text-prefix keys to embeddings.
///
/// Each operation holds the lock for its whole read or insert+evict step, so
/// concurrent embeds on a multi-threaded runtime see the same atomicity as a
/// single-threaded event loop.
pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(defaults::EMBED_CACHE_CAPACITY)
    }
}

impl EmbeddingCache {
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up an embedding. A hit does not change eviction order.
    pub fn get(&self, key: &str) -> Option<Embedding> {
        let mut inner = self.lock();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        found
    }

    /// Insert an embedding, then evict the oldest entry if over capacity.
    ///
    /// Re-inserting an existing key replaces its value but keeps its original
    /// position. Returns the evicted key, if any.
    pub fn put(&self, key: String, embedding: Embedding) -> Option<String> {
        let mut inner = self.lock();
        if !inner.entries.contains_key(&key) {
            inner.order.push_back(key.clone());
        }
        inner.entries.insert(key, embedding);
        Self::evict_locked(&mut inner, self.capacity)
    }

    /// Evict the single oldest entry if the cache holds more than `capacity`.
    pub fn evict_if_over_capacity(&self) -> Option<String> {
        let mut inner = self.lock();
        Self::evict_locked(&mut inner, self.capacity)
    }

    fn evict_locked(inner: &mut CacheInner, capacity: usize) -> Option<String> {
        if inner.entries.len() <= capacity {
            return None;
        }
        let oldest = inner.order.pop_front()?;
        inner.entries.remove(&oldest);
        inner.stats.evictions += 1;
        trace!(cache_size = inner.entries.len(), "Evicted oldest embedding");
        Some(oldest)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}
