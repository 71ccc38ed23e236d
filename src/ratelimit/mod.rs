//! Caller rate limiting
//!
//! Gates batch submissions, single retries and exports per caller identity.

mod limiter;

pub use limiter::{RateBucket, RateDecision, RateLimiter};

use std::time::Duration;

/// Default submissions per window for the `scrape:` keyspace
pub const DEFAULT_SCRAPE_LIMIT: u32 = 30;

/// Default exports per window for the `export:` keyspace
pub const DEFAULT_EXPORT_LIMIT: u32 = 20;

/// Default window for both keyspaces
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Builds the limiter key for a scrape submission
pub fn scrape_key(caller: &str) -> String {
    format!("scrape:{}", caller)
}

/// Builds the limiter key for an export request
pub fn export_key(caller: &str) -> String {
    format!("export:{}", caller)
}
