use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Per-key fixed-window counter
#[derive(Debug, Clone, Copy)]
pub struct RateBucket {
    /// Requests counted in the current window
    pub count: u32,

    /// When the current window ends
    pub reset_at: Instant,
}

/// Result of one [`RateLimiter::consume`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,

    /// Requests still available in the current window
    pub remaining: u32,

    /// Time until the current window resets
    pub reset_in: Duration,
}

/// Fixed-window request limiter keyed by caller identity
///
/// Independent of the per-domain politeness delay: this bounds how often a
/// caller may submit work, not how often a target is contacted.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, RateBucket>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter whose [`RateLimiter::consume`] uses `limit` per `window`
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request for `key` against the default quota
    pub fn consume(&self, key: &str) -> RateDecision {
        self.consume_at(key, self.limit, self.window, Instant::now())
    }

    /// Counts one request for `key` against an explicit quota
    pub fn consume_with(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        self.consume_at(key, limit, window, Instant::now())
    }

    /// Counts one request for `key` as seen at `now`
    ///
    /// # Arguments
    ///
    /// * `key` - Caller identity, e.g. `scrape:cli`
    /// * `limit` - Requests allowed per window
    /// * `window` - Window length
    /// * `now` - Current time
    ///
    /// # Returns
    ///
    /// The decision, with the remaining quota and the time until the window resets
    pub fn consume_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> RateDecision {
        let mut buckets = self.lock();
        buckets.retain(|_, bucket| bucket.reset_at > now);

        let bucket = match buckets.entry(key.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                vacant.insert(RateBucket {
                    count: 1,
                    reset_at: now + window,
                });
                return RateDecision {
                    allowed: true,
                    remaining: limit.saturating_sub(1),
                    reset_in: window,
                };
            }
        };

        let reset_in = bucket.reset_at.saturating_duration_since(now);
        if bucket.count >= limit {
            tracing::debug!("Rate limit reached for {} ({}/{})", key, bucket.count, limit);
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }

        bucket.count += 1;
        RateDecision {
            allowed: true,
            remaining: limit.saturating_sub(bucket.count),
            reset_in,
        }
    }

    /// Drops every bucket
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Returns the number of keys with an open window
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateBucket>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}
