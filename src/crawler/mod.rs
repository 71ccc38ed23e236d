//! Crawler module for fetching and scraping circuit pages
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry and backoff
//! - Failure classification into the error taxonomy
//! - The per-URL validate/cache/fetch/extract pipeline
//! - Per-domain politeness scheduling
//! - Batch orchestration over a bounded worker pool

pub mod classify;
mod coordinator;
mod fetcher;
mod pipeline;
mod scheduler;

pub use classify::{classify, classify_message, classify_status, RawFailure};
pub use coordinator::{
    BatchReport, Orchestrator, OrchestratorSettings, QueueItem, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY,
};
pub use fetcher::{
    build_http_client, FetchPolicy, Fetcher, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT,
};
pub use pipeline::{ItemProcessor, ScrapePipeline};
pub use scheduler::{DomainThrottle, DEFAULT_DOMAIN_DELAY};

use crate::config::Config;
use crate::ratelimit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

/// Builds an orchestrator over the full scraping pipeline
///
/// # Arguments
///
/// * `config` - Validated configuration
///
/// # Returns
///
/// * `Ok(Orchestrator)` - Ready to accept batches
/// * `Err(reqwest::Error)` - Failed to build the HTTP client
pub fn build_orchestrator(
    config: &Config,
) -> Result<Orchestrator<ScrapePipeline>, reqwest::Error> {
    let pipeline = ScrapePipeline::from_config(config)?;
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.limit,
        Duration::from_secs(config.rate_limit.window_secs),
    ));

    Ok(Orchestrator::new(
        pipeline,
        OrchestratorSettings::from(config),
        limiter,
    ))
}
