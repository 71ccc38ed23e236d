//! TTL result cache shared by every worker in the process

use crate::cache::CacheEntry;
use crate::record::CircuitRecord;
use crate::url::normalize_cache_key;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time-to-live for cached records
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn purge_expired(&mut self, now: Instant) {
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}

/// Key-value store from normalized URL to extracted record
///
/// Only successful extractions are stored. Expired entries are evicted
/// lazily on every access; there is no background sweep.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    default_ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResultCache {
    /// Creates an empty cache whose entries live for `default_ttl`
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            default_ttl,
        }
    }

    /// Returns the TTL applied by [`ResultCache::set`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Looks up the record cached for `url`
    ///
    /// The returned record is tagged as served from cache.
    pub fn get(&self, url: &str) -> Option<CircuitRecord> {
        self.get_at(url, Instant::now())
    }

    /// Looks up the record cached for `url` as seen at `now`
    pub fn get_at(&self, url: &str, now: Instant) -> Option<CircuitRecord> {
        let key = normalize_cache_key(url);
        let mut inner = self.lock();
        inner.purge_expired(now);

        let found = inner.entries.get(&key).map(|entry| {
            let mut record = entry.record.clone();
            record.from_cache = true;
            record
        });

        if found.is_some() {
            inner.hits += 1;
            tracing::trace!("Cache hit for {}", key);
        } else {
            inner.misses += 1;
            tracing::trace!("Cache miss for {}", key);
        }

        found
    }

    /// Stores `record` under `url` with the default TTL
    pub fn set(&self, url: &str, record: CircuitRecord) {
        self.set_at(url, record, self.default_ttl, Instant::now());
    }

    /// Stores `record` under `url` with an explicit TTL
    pub fn set_with_ttl(&self, url: &str, record: CircuitRecord, ttl: Duration) {
        self.set_at(url, record, ttl, Instant::now());
    }

    /// Stores `record` under `url` as of `now`
    ///
    /// Any previous entry for the same normalized key is replaced.
    pub fn set_at(&self, url: &str, mut record: CircuitRecord, ttl: Duration, now: Instant) {
        let key = normalize_cache_key(url);
        record.from_cache = false;

        let mut inner = self.lock();
        inner.purge_expired(now);
        inner.entries.insert(key, CacheEntry::new(record, ttl, now));
    }

    /// Removes every entry
    pub fn flush(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        tracing::debug!("Result cache flushed");
    }

    /// Returns the number of live entries
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns occupancy and hit counters
    pub fn stats(&self) -> CacheStats {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding the lock cannot leave a half-written map
        // entry, so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
