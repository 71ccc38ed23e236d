//! Circuit Scraper: structured extraction of travel-package pages
//!
//! This crate fetches third-party travel-package pages politely and at scale,
//! turns their semi-structured HTML into typed [`CircuitRecord`]s, and reports
//! every submitted URL as exactly one success or one classified error.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod ratelimit;
pub mod record;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch of {size} URLs exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Batch contains no URLs")]
    EmptyBatch,

    #[error("A batch is already running")]
    BatchRunning,

    #[error("Rate limit exceeded, retry in {reset_in:?}")]
    RateLimited { reset_in: Duration },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
///
/// These are terminal for the URL that produced them: a rejected target is
/// never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    Parse(String),

    #[error("Only http/https URLs are allowed, got: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Private or local network URLs are not allowed: {0}")]
    PrivateHost(String),

    #[error("Domain is not allowed by server policy: {0}")]
    HostNotAllowed(String),
}

/// A classified fetch failure
///
/// Produced by the fetcher once its retry budget is spent (or immediately for
/// non-retryable failures).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    /// Taxonomy label driving retry decisions and user-facing display
    pub kind: state::ErrorKind,

    /// HTTP status, when the server answered
    pub status: Option<u16>,

    /// Human-readable description
    pub message: String,

    /// Number of requests issued before giving up
    pub attempts: u32,
}

/// Extraction errors
///
/// The extractor tolerates missing data; it only fails when the input cannot
/// be treated as an HTML document at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Document is not HTML: {0}")]
    NotHtml(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{CircuitRecord, ScrapeFailure, ScrapeOutcome};
pub use state::{ErrorKind, ItemStatus};
pub use url::{normalize_cache_key, validate_target_url, UrlPolicy};
