//! Per-domain politeness scheduling
//!
//! Workers share one [`DomainThrottle`]. Before contacting a target they
//! reserve that domain's next request slot and sleep for the returned delay,
//! so requests to one domain are spaced at least `min_delay` apart no matter
//! how many workers are running.

use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Default minimum time between two requests to the same domain
pub const DEFAULT_DOMAIN_DELAY: Duration = Duration::from_millis(600);

/// Shared map of domain -> last request time
#[derive(Debug)]
pub struct DomainThrottle {
    states: Mutex<HashMap<String, DomainState>>,
    min_delay: Duration,
}

impl Default for DomainThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN_DELAY)
    }
}

impl DomainThrottle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            min_delay,
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Reserves the next request slot for `domain`
    ///
    /// # Returns
    ///
    /// How long the caller must wait before issuing its request. Reservations
    /// are FIFO per domain: the slot is recorded before the caller sleeps.
    pub fn reserve(&self, domain: &str) -> Duration {
        self.reserve_at(domain, Instant::now())
    }

    pub fn reserve_at(&self, domain: &str, now: Instant) -> Duration {
        let mut states = self.lock();
        let state = states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new);
        let wait = state.reserve(self.min_delay, now);

        tracing::trace!(
            "Reserved slot {} for {} (wait {:?})",
            state.request_count,
            domain,
            wait
        );
        wait
    }

    /// Number of requests reserved for `domain` so far
    pub fn request_count(&self, domain: &str) -> u32 {
        self.lock()
            .get(domain)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }

    /// Number of domains contacted so far
    pub fn domain_count(&self) -> usize {
        self.lock().len()
    }

    /// Forgets every domain
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DomainState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(600);

    #[test]
    fn test_first_request_is_immediate() {
        let throttle = DomainThrottle::new(DELAY);
        assert_eq!(throttle.reserve_at("example.com", Instant::now()), Duration::ZERO);
        assert_eq!(throttle.request_count("example.com"), 1);
    }

    #[test]
    fn test_same_domain_is_spaced() {
        let throttle = DomainThrottle::new(DELAY);
        let now = Instant::now();

        assert_eq!(throttle.reserve_at("example.com", now), Duration::ZERO);
        assert_eq!(throttle.reserve_at("example.com", now), DELAY);
        assert_eq!(
            throttle.reserve_at("example.com", now + Duration::from_millis(100)),
            DELAY * 2 - Duration::from_millis(100)
        );
    }

    #[test]
    fn test_domains_are_independent() {
        let throttle = DomainThrottle::new(DELAY);
        let now = Instant::now();

        throttle.reserve_at("a.example.com", now);
        assert_eq!(throttle.reserve_at("b.example.com", now), Duration::ZERO);
        assert_eq!(throttle.domain_count(), 2);
    }

    #[test]
    fn test_delay_elapsed() {
        let throttle = DomainThrottle::new(DELAY);
        let now = Instant::now();

        throttle.reserve_at("example.com", now);
        assert_eq!(
            throttle.reserve_at("example.com", now + Duration::from_secs(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_reset() {
        let throttle = DomainThrottle::default();
        throttle.reserve("example.com");
        throttle.reset();
        assert_eq!(throttle.domain_count(), 0);
        assert_eq!(throttle.request_count("example.com"), 0);
    }
}
