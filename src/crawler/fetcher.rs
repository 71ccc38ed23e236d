//! HTTP fetcher implementation
//!
//! This module is the only place that talks to target sites. It handles:
//! - Building the HTTP client with browser-like headers
//! - GET requests with a hard timeout
//! - Re-validating every redirect hop against the target policy
//! - Exponential backoff between retries of transient failures
//! - Classification of every failure into an [`ErrorKind`]
//!
//! It knows nothing about extraction; a successful fetch is just a body.

use crate::config::FetchConfig;
use crate::crawler::classify::{classify, RawFailure};
use crate::state::ErrorKind;
use crate::url::{validate_target_url, UrlPolicy};
use crate::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect;
use reqwest::Client;
use std::time::Duration;

/// Browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept-Language sent with every request
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Longest redirect chain followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// Timeout, retry and header settings for the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Hard limit for one request, body included
    pub timeout: Duration,

    /// Additional attempts after the first one for retryable failures
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each later one
    pub initial_backoff: Duration,

    pub user_agent: String,
    pub accept_language: String,

    /// Policy every redirect target must pass
    pub targets: UrlPolicy,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 1,
            initial_backoff: Duration::from_millis(2000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            targets: UrlPolicy::default(),
        }
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            targets: UrlPolicy::default(),
        }
    }
}

impl FetchPolicy {
    /// Returns the delay to sleep before retry number `attempt + 1`
    ///
    /// `initial_backoff * 2^attempt`, saturating on overflow.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }
}

/// Builds an HTTP client for the given policy
///
/// # Arguments
///
/// * `policy` - Timeout, header and redirect-target settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(policy: &FetchPolicy) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    if let Ok(value) = HeaderValue::from_str(&policy.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    let targets = policy.targets.clone();
    let redirects = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("too many redirects (more than {})", MAX_REDIRECTS));
        }
        match validate_target_url(attempt.url().as_str(), &targets) {
            Ok(_) => attempt.follow(),
            Err(e) => {
                tracing::warn!("Refusing redirect to {}: {}", attempt.url(), e);
                attempt.error(e)
            }
        }
    });

    Client::builder()
        .user_agent(policy.user_agent.clone())
        .redirect(redirects)
        .default_headers(headers)
        .timeout(policy.timeout)
        .connect_timeout(policy.timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves raw page HTML with retry and classification
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(policy: FetchPolicy) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&policy)?;
        Ok(Self { client, policy })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, policy: FetchPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Kind | Action |
    /// |-----------|------|--------|
    /// | HTTP 2xx | | Return body |
    /// | HTTP 429 | rate-limit | Retry with backoff |
    /// | HTTP 5xx | server-error | Retry with backoff |
    /// | HTTP 403 | forbidden | Fail immediately |
    /// | Other 4xx | unknown | Fail immediately |
    /// | Timeout | timeout | Retry with backoff |
    /// | Connection/DNS/body failure | network | Retry with backoff |
    ///
    /// Retryable failures surface with their own kind once `max_retries`
    /// additional attempts have failed.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch; expected to have passed validation
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body
    /// * `Err(FetchError)` - The classified failure of the last attempt
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            let failure = match self.fetch_once(url).await {
                Ok(body) => {
                    if attempt > 0 {
                        tracing::debug!("Fetched {} after {} retries", url, attempt);
                    }
                    return Ok(body);
                }
                Err(failure) => failure,
            };

            let kind = classify(&failure);
            if kind.is_retryable() && attempt < self.policy.max_retries {
                let delay = self.policy.backoff_delay(attempt);
                tracing::warn!(
                    "Fetch of {} failed ({}), retrying in {:?} (attempt {}/{})",
                    url,
                    kind,
                    delay,
                    attempt + 1,
                    self.policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(self.to_fetch_error(failure, kind, attempt + 1));
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, RawFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_failure(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RawFailure::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| self.transport_failure(&e))
    }

    fn transport_failure(&self, error: &reqwest::Error) -> RawFailure {
        if error.is_timeout() {
            RawFailure::Timeout
        } else if error.is_redirect() {
            RawFailure::Redirect(error_chain(error))
        } else if error.is_connect() || error.is_request() {
            RawFailure::Connection(error.to_string())
        } else if error.is_body() || error.is_decode() {
            RawFailure::Body(error.to_string())
        } else {
            RawFailure::Other(error.to_string())
        }
    }

    fn to_fetch_error(&self, failure: RawFailure, kind: ErrorKind, attempts: u32) -> FetchError {
        let (status, message) = match failure {
            RawFailure::Status(code) => (Some(code), format!("HTTP {}", code)),
            RawFailure::Timeout => (
                None,
                format!("Request timed out after {}s", self.policy.timeout.as_secs()),
            ),
            RawFailure::Connection(msg)
            | RawFailure::Body(msg)
            | RawFailure::Redirect(msg)
            | RawFailure::Parse(msg)
            | RawFailure::Other(msg) => (None, msg),
        };

        FetchError {
            kind,
            status,
            message,
            attempts,
        }
    }
}

/// Error message including its sources, which carry the refusal reason
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
