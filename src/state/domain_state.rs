use std::time::Duration;
use tokio::time::Instant;

/// Tracks politeness state for one target domain during a batch
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests reserved for this domain in the current batch
    pub request_count: u32,

    /// Time the most recent request was (or will be) issued
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can be made to this domain right now
    pub fn can_request(&self, min_delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(min_delay, now).is_none()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + min_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Records that a request was issued at `at`
    pub fn record_request(&mut self, at: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(at);
    }

    /// Reserves the next request slot and returns how long the caller must wait
    ///
    /// The slot is recorded immediately, so concurrent callers for the same
    /// domain queue up behind each other in reservation order.
    pub fn reserve(&mut self, min_delay: Duration, now: Instant) -> Duration {
        let wait = self
            .time_until_next_request(min_delay, now)
            .unwrap_or(Duration::ZERO);
        self.record_request(now + wait);
        wait
    }
}
