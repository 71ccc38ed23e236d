use crate::crawler::{DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT};
use serde::Deserialize;

/// Main configuration structure for the scraper
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Batch scheduling configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    /// Number of concurrent workers per batch
    pub concurrency: usize,

    /// Minimum time between two requests to the same domain (milliseconds)
    #[serde(rename = "domain-delay-ms")]
    pub domain_delay_ms: u64,

    /// Largest accepted batch
    #[serde(rename = "max-batch-size")]
    pub max_batch_size: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            domain_delay_ms: 600,
            max_batch_size: 300,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    /// Hard timeout for one request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a retryable failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on each further attempt (milliseconds)
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 1,
            initial_backoff_ms: 2000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached record (seconds)
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: u64,

    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 1800,
            enabled: true,
        }
    }
}

/// Caller rate limit configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window and caller key
    pub limit: u32,

    #[serde(rename = "window-secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 30,
            window_secs: 60,
        }
    }
}

/// Target host restrictions
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Host patterns (e.g., "example.com" or "*.example.com"); empty allows any public host
    #[serde(rename = "allowed-hosts")]
    pub allowed_hosts: Vec<String>,
}
