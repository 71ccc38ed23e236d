//! Per-URL scraping pipeline
//!
//! Validator -> Cache -> Fetcher -> Extractor. Every call resolves to exactly
//! one [`ScrapeOutcome`]; nothing here panics or propagates an error.

use crate::cache::ResultCache;
use crate::config::Config;
use crate::crawler::fetcher::{FetchPolicy, Fetcher};
use crate::extract::parse_circuit_page;
use crate::record::{ScrapeFailure, ScrapeOutcome};
use crate::state::ErrorKind;
use crate::url::{validate_target_url, UrlPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Work applied to one queue item by the orchestrator
///
/// Implemented by [`ScrapePipeline`]; tests substitute lightweight fakes.
pub trait ItemProcessor: Send + Sync + 'static {
    /// Resolves `url` to a success record or a classified failure
    fn process(&self, url: &str) -> impl Future<Output = ScrapeOutcome> + Send;
}

/// The full validate/cache/fetch/extract pipeline
#[derive(Debug, Clone)]
pub struct ScrapePipeline {
    policy: UrlPolicy,
    cache: Arc<ResultCache>,
    fetcher: Fetcher,
    cache_enabled: bool,
}

impl ScrapePipeline {
    pub fn new(policy: UrlPolicy, cache: Arc<ResultCache>, fetcher: Fetcher) -> Self {
        Self {
            policy,
            cache,
            fetcher,
            cache_enabled: true,
        }
    }

    /// Builds a pipeline from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapePipeline)` - Pipeline with its own HTTP client and cache
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let policy = UrlPolicy::new(config.security.allowed_hosts.clone());
        let fetch_policy = FetchPolicy {
            targets: policy.clone(),
            ..FetchPolicy::from(&config.fetch)
        };
        let fetcher = Fetcher::new(fetch_policy)?;
        let cache = Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_secs)));

        Ok(Self::new(policy, cache, fetcher).with_cache_enabled(config.cache.enabled))
    }

    /// Turns result caching on or off
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn policy(&self) -> &UrlPolicy {
        &self.policy
    }

    /// Runs one URL through the pipeline
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        let url = url.trim();

        let target = match validate_target_url(url, &self.policy) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", url, e);
                return ScrapeFailure::rejected(url, &e).into();
            }
        };

        // Records carry the parsed form of the URL; failures keep the submitted text.
        let canonical = target.as_str();

        if self.cache_enabled {
            if let Some(record) = self.cache.get(canonical) {
                return record.into();
            }
        }

        let body = match self.fetcher.fetch(canonical).await {
            Ok(body) => body,
            Err(e) => return ScrapeFailure::fetch(url, &e).into(),
        };

        let mut record = match parse_circuit_page(&body, canonical) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Failed to parse {}: {}", url, e);
                return ScrapeFailure::new(url, ErrorKind::Parse, e.to_string()).into();
            }
        };

        record.from_cache = false;
        if self.cache_enabled {
            self.cache.set(canonical, record.clone());
        }
        record.into()
    }
}

impl ItemProcessor for ScrapePipeline {
    fn process(&self, url: &str) -> impl Future<Output = ScrapeOutcome> + Send {
        self.scrape(url)
    }
}
