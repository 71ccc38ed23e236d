//! Cache entry with expiry bookkeeping

use crate::record::CircuitRecord;
use std::time::{Duration, Instant};

/// A cached extraction result
///
/// Entries are superseded, never merged: storing a record for a key that
/// already has one replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The record as it was extracted
    pub record: CircuitRecord,

    /// When the entry was stored
    pub created_at: Instant,

    /// When the entry stops being served
    pub expires_at: Instant,
}

impl CacheEntry {
    /// Creates an entry stored at `now` that lives for `ttl`
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted record
    /// * `ttl` - How long the entry may be served
    /// * `now` - Storage time
    pub fn new(record: CircuitRecord, ttl: Duration, now: Instant) -> Self {
        Self {
            record,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Checks if the entry has expired at `now`
    ///
    /// # Returns
    ///
    /// * `true` - If `now` is at or past the expiry time
    /// * `false` - If the entry is still fresh
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Returns how long ago the entry was stored
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_not_expired() {
        let now = Instant::now();
        let entry = CacheEntry::new(
            CircuitRecord::empty("https://example.com/a"),
            Duration::from_secs(60),
            now,
        );
        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::from_secs(59)));
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let now = Instant::now();
        let entry = CacheEntry::new(
            CircuitRecord::empty("https://example.com/a"),
            Duration::from_secs(60),
            now,
        );
        assert!(entry.is_expired(now + Duration::from_secs(60)));
        assert_eq!(entry.age(now + Duration::from_secs(10)), Duration::from_secs(10));
    }
}
