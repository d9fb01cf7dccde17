//! Answer cache with TTL and LRU bounds.
//!
//! # Responsibilities
//! - Memoize answers by question fingerprint
//! - Enforce the size bound (LRU eviction) and the TTL (lazy, on read)
//! - Count hits and misses
//!
//! # Design Decisions
//! - `0` for either bound means "unbounded" in that dimension
//! - Never surfaces errors: a poisoned lock is a miss / a dropped write

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::observability::preview;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

/// Cache statistics as exposed to status and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    /// `0` = unbounded.
    pub capacity: usize,
    /// `0` = no expiry.
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe answer cache.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            entries: Mutex::new(entries),
            capacity,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs))
    }

    /// Cached value for `key`, if present and fresh.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self.lookup(key);
        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let Ok(mut entries) = self.entries.lock() else {
            tracing::error!("Cache lock poisoned, treating as miss");
            return None;
        };

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry),
        };

        if expired {
            entries.pop(key);
            tracing::debug!(key = %preview(key), "Cache entry expired");
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite, evicting the least recently used entry when full.
    pub fn set(&self, key: &str, value: &str) {
        let Ok(mut entries) = self.entries.lock() else {
            tracing::error!("Cache lock poisoned, dropping write");
            return;
        };

        let entry = CacheEntry {
            value: value.to_string(),
            inserted_at: Instant::now(),
        };

        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                tracing::debug!(key = %preview(&evicted), "Cache entry evicted");
            }
        }
    }

    pub fn stat(&self) -> CacheStats {
        let size = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        CacheStats {
            size,
            capacity: self.capacity,
            ttl_secs: self.ttl.as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        !self.ttl.is_zero() && entry.inserted_at.elapsed() >= self.ttl
    }
}

/// Cache key for a question: trimmed, whitespace runs collapsed.
pub fn fingerprint(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
