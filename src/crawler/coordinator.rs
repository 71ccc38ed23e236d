//! Batch orchestration
//!
//! This module runs a batch of URLs through an [`ItemProcessor`] with a
//! bounded pool of workers:
//! - Workers claim items from a shared atomic cursor, so no item is claimed twice
//! - Each claim waits out the per-domain politeness delay first
//! - A cancellation token is checked before every claim and during every wait
//! - Retries re-run only the failed items and keep finished results
//! - Only one batch or retry runs at a time; overlapping calls are refused

use crate::config::Config;
use crate::crawler::pipeline::ItemProcessor;
use crate::crawler::scheduler::DomainThrottle;
use crate::output::BatchSummary;
use crate::ratelimit::{export_key, scrape_key, RateLimiter, DEFAULT_EXPORT_LIMIT, DEFAULT_WINDOW};
use crate::record::ScrapeOutcome;
use crate::state::ItemStatus;
use crate::url::domain_of;
use crate::ScraperError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default number of concurrent workers
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Upper bound on concurrent workers
pub const MAX_CONCURRENCY: usize = 5;

/// One URL of a batch and where it stands
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// The URL as submitted
    pub url: String,

    pub status: ItemStatus,

    /// Set once the item is done or errored
    pub outcome: Option<ScrapeOutcome>,
}

impl QueueItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ItemStatus::Pending,
            outcome: None,
        }
    }

    fn resolve(&mut self, outcome: ScrapeOutcome) {
        self.status = if outcome.is_success() {
            ItemStatus::Done
        } else {
            ItemStatus::Error
        };
        self.outcome = Some(outcome);
    }

    /// Returns true if the item resolved from the result cache
    pub fn from_cache(&self) -> bool {
        self.outcome
            .as_ref()
            .map(ScrapeOutcome::from_cache)
            .unwrap_or(false)
    }
}

/// Worker pool and batch-size settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Number of concurrent workers, clamped to 1..=5
    pub concurrency: usize,

    /// Minimum time between two requests to the same domain
    pub domain_delay: Duration,

    /// Largest accepted batch
    pub max_batch_size: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            domain_delay: Duration::from_millis(600),
            max_batch_size: crate::config::MAX_BATCH_SIZE,
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.scraper.concurrency,
            domain_delay: Duration::from_millis(config.scraper.domain_delay_ms),
            max_batch_size: config.scraper.max_batch_size,
        }
    }
}

/// State of every item once a batch has stopped
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub items: Vec<QueueItem>,
    pub summary: BatchSummary,

    /// True if the batch was stopped before every item was claimed
    pub cancelled: bool,
}

impl BatchReport {
    /// Outcomes of the resolved items, in submission order
    pub fn outcomes(&self) -> impl Iterator<Item = &ScrapeOutcome> {
        self.items.iter().filter_map(|item| item.outcome.as_ref())
    }

    /// URLs that resolved to an error
    pub fn failed_urls(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Error)
            .map(|item| item.url.clone())
            .collect()
    }
}

/// Runs batches of URLs through a processor with bounded concurrency
pub struct Orchestrator<P: ItemProcessor> {
    processor: Arc<P>,
    settings: OrchestratorSettings,
    throttle: Arc<DomainThrottle>,
    limiter: Arc<RateLimiter>,
    items: Arc<Mutex<Vec<QueueItem>>>,
    token: Mutex<CancellationToken>,
    running: AtomicBool,
}

/// Marks the orchestrator busy until dropped
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P: ItemProcessor> Orchestrator<P> {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `processor` - The work applied to each item
    /// * `settings` - Worker pool size, politeness delay and batch ceiling
    /// * `limiter` - Caller rate limiter gating submissions and retries
    pub fn new(processor: P, settings: OrchestratorSettings, limiter: Arc<RateLimiter>) -> Self {
        let throttle = Arc::new(DomainThrottle::new(settings.domain_delay));

        Self {
            processor: Arc::new(processor),
            settings,
            throttle,
            limiter,
            items: Arc::new(Mutex::new(Vec::new())),
            token: Mutex::new(CancellationToken::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Token of the current (or most recent) batch
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns true while a batch or retry is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Requests cooperative cancellation of the running batch
    ///
    /// Workers stop claiming new items; requests already issued complete.
    /// With no batch running this has no effect: every batch starts with
    /// its own token, so an earlier cancel never carries over. To stop a
    /// batch from the moment it starts, cancel the token handed to
    /// [`Orchestrator::run_batch_with_token`] instead.
    pub fn cancel(&self) {
        if !self.is_running() {
            tracing::debug!("Cancellation requested with no batch running");
            return;
        }
        tracing::info!("Cancellation requested");
        self.cancellation_token().cancel();
    }

    /// Snapshot of every item of the current batch
    pub fn items(&self) -> Vec<QueueItem> {
        self.lock_items().clone()
    }

    /// Drops every item and result
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The queue is empty
    /// * `Err(ScraperError::BatchRunning)` - Items are still being worked on
    pub fn clear(&self) -> Result<(), ScraperError> {
        let _guard = self.begin_batch(CancellationToken::new())?;
        self.lock_items().clear();
        Ok(())
    }

    /// Counts one export against the caller's export quota
    ///
    /// Exports share the limiter with submissions but use their own key
    /// and a fixed quota of [`DEFAULT_EXPORT_LIMIT`] per [`DEFAULT_WINDOW`].
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The caller may export
    /// * `Err(ScraperError::RateLimited)` - Export quota exhausted for the current window
    pub fn check_export_limit(&self, caller: &str) -> Result<(), ScraperError> {
        let decision = self
            .limiter
            .consume_with(&export_key(caller), DEFAULT_EXPORT_LIMIT, DEFAULT_WINDOW);
        if decision.allowed {
            Ok(())
        } else {
            tracing::warn!(
                "Caller {} exceeded the export quota, retry in {:?}",
                caller,
                decision.reset_in
            );
            Err(ScraperError::RateLimited {
                reset_in: decision.reset_in,
            })
        }
    }

    /// Counts one submission against the caller's quota
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The caller may proceed
    /// * `Err(ScraperError::RateLimited)` - Quota exhausted for the current window
    pub fn check_rate_limit(&self, caller: &str) -> Result<(), ScraperError> {
        let decision = self.limiter.consume(&scrape_key(caller));
        if decision.allowed {
            Ok(())
        } else {
            tracing::warn!(
                "Caller {} is rate limited for another {:?}",
                caller,
                decision.reset_in
            );
            Err(ScraperError::RateLimited {
                reset_in: decision.reset_in,
            })
        }
    }

    /// Submits a batch on behalf of `caller`
    ///
    /// The caller's rate limit is checked first; see [`Orchestrator::run_batch`].
    pub async fn submit(
        &self,
        caller: &str,
        urls: Vec<String>,
    ) -> Result<BatchReport, ScraperError> {
        self.check_rate_limit(caller)?;
        self.run_batch(urls).await
    }

    /// Runs a fresh batch, replacing any previous items
    pub async fn run_batch(&self, urls: Vec<String>) -> Result<BatchReport, ScraperError> {
        self.run_batch_with_token(urls, CancellationToken::new())
            .await
    }

    /// Runs a fresh batch that stops when `token` is cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - Every item claimed before cancellation resolved
    /// * `Err(ScraperError::EmptyBatch)` - No URLs were given
    /// * `Err(ScraperError::BatchTooLarge)` - More URLs than the batch ceiling
    /// * `Err(ScraperError::BatchRunning)` - Another batch has not finished yet
    pub async fn run_batch_with_token(
        &self,
        urls: Vec<String>,
        token: CancellationToken,
    ) -> Result<BatchReport, ScraperError> {
        self.check_batch_size(urls.len())?;
        let _guard = self.begin_batch(token.clone())?;

        let items: Vec<QueueItem> = urls.into_iter().map(QueueItem::new).collect();
        let indices = (0..items.len()).collect();
        *self.lock_items() = items;

        Ok(self.drive(indices, token).await)
    }

    /// Re-runs only the items that errored, as a fresh batch
    ///
    /// Done items keep their results. Items left pending by a cancelled
    /// batch are dropped.
    pub async fn retry_errors(&self, caller: &str) -> Result<BatchReport, ScraperError> {
        let token = CancellationToken::new();
        let _guard = self.begin_batch(token.clone())?;

        let failed = self
            .lock_items()
            .iter()
            .filter(|item| item.status == ItemStatus::Error)
            .count();
        self.check_batch_size(failed)?;
        self.check_rate_limit(caller)?;

        let indices = {
            let mut items = self.lock_items();
            items.retain(|item| item.status != ItemStatus::Pending);

            let mut indices = Vec::new();
            for (index, item) in items.iter_mut().enumerate() {
                if item.status == ItemStatus::Error {
                    *item = QueueItem::new(item.url.clone());
                    indices.push(index);
                }
            }
            indices
        };

        tracing::info!("Retrying {} failed URLs", indices.len());
        Ok(self.drive(indices, token).await)
    }

    /// Re-runs one URL outside the queue
    ///
    /// If the current batch holds an errored item for `url`, its result is
    /// replaced; done items are never touched.
    pub async fn retry_one(&self, caller: &str, url: &str) -> Result<ScrapeOutcome, ScraperError> {
        self.check_rate_limit(caller)?;

        if let Some(domain) = domain_of(url) {
            let wait = self.throttle.reserve(&domain);
            if !wait.is_zero() {
                tracing::trace!("Waiting {:?} before contacting {}", wait, domain);
                tokio::time::sleep(wait).await;
            }
        }

        let outcome = self.processor.process(url).await;

        {
            let mut items = self.lock_items();
            let target = url.trim();
            if let Some(item) = items
                .iter_mut()
                .find(|item| item.status == ItemStatus::Error && item.url.trim() == target)
            {
                item.resolve(outcome.clone());
            }
        }

        Ok(outcome)
    }

    /// Claims the orchestrator for one batch and installs its token
    fn begin_batch(&self, token: CancellationToken) -> Result<RunGuard<'_>, ScraperError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ScraperError::BatchRunning)?;
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
        Ok(RunGuard(&self.running))
    }

    fn check_batch_size(&self, size: usize) -> Result<(), ScraperError> {
        if size == 0 {
            return Err(ScraperError::EmptyBatch);
        }
        if size > self.settings.max_batch_size {
            return Err(ScraperError::BatchTooLarge {
                size,
                max: self.settings.max_batch_size,
            });
        }
        Ok(())
    }

    /// Runs the worker pool over `indices` until every one is claimed or
    /// `token` is cancelled, then waits for all workers to exit
    async fn drive(&self, indices: Vec<usize>, token: CancellationToken) -> BatchReport {
        let started = Instant::now();
        let workers = self
            .settings
            .concurrency
            .clamp(1, MAX_CONCURRENCY)
            .min(indices.len().max(1));

        tracing::info!(
            "Starting batch of {} URLs with {} workers",
            indices.len(),
            workers
        );

        let queue = Arc::new(indices);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut pool = JoinSet::new();

        for id in 0..workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                cursor: Arc::clone(&cursor),
                items: Arc::clone(&self.items),
                processor: Arc::clone(&self.processor),
                throttle: Arc::clone(&self.throttle),
                token: token.clone(),
            };
            pool.spawn(worker.run());
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Worker task failed: {}", e);
            }
        }

        let items = self.items();
        let summary = BatchSummary::from_items(&items, started.elapsed());
        let cancelled = token.is_cancelled();

        tracing::info!(
            "Batch {}: {} done, {} errors, {} pending in {:?}",
            if cancelled { "stopped" } else { "finished" },
            summary.done,
            summary.errors,
            summary.pending,
            summary.elapsed
        );

        BatchReport {
            items,
            summary,
            cancelled,
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<QueueItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One worker loop of a running batch
struct Worker<P> {
    id: usize,
    queue: Arc<Vec<usize>>,
    cursor: Arc<AtomicUsize>,
    items: Arc<Mutex<Vec<QueueItem>>>,
    processor: Arc<P>,
    throttle: Arc<DomainThrottle>,
    token: CancellationToken,
}

impl<P: ItemProcessor> Worker<P> {
    async fn run(self) {
        loop {
            if self.token.is_cancelled() {
                tracing::debug!("Worker {} stopping: batch cancelled", self.id);
                break;
            }

            let slot = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(&index) = self.queue.get(slot) else {
                break;
            };
            let Some(url) = self.url_at(index) else {
                break;
            };

            if !self.wait_for_domain(&url).await {
                tracing::debug!("Worker {} stopping during politeness wait", self.id);
                break;
            }

            self.update(index, |item| {
                if item.status.can_transition_to(ItemStatus::Active) {
                    item.status = ItemStatus::Active;
                }
            });
            tracing::debug!("Worker {} claimed item {}: {}", self.id, index, url);

            let outcome = self.processor.process(&url).await;
            tracing::debug!(
                "Worker {} finished item {}: {}",
                self.id,
                index,
                if outcome.is_success() { "done" } else { "error" }
            );

            self.update(index, |item| item.resolve(outcome));
        }
    }

    /// Sleeps out the politeness delay for the URL's domain
    ///
    /// Returns false if the batch was cancelled before the wait ended.
    async fn wait_for_domain(&self, url: &str) -> bool {
        let Some(domain) = domain_of(url) else {
            return !self.token.is_cancelled();
        };

        let wait = self.throttle.reserve(&domain);
        if wait.is_zero() {
            return !self.token.is_cancelled();
        }

        tracing::trace!("Waiting {:?} before contacting {}", wait, domain);
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(wait) => true,
        }
    }

    fn url_at(&self, index: usize) -> Option<String> {
        self.lock_items().get(index).map(|item| item.url.clone())
    }

    fn update(&self, index: usize, f: impl FnOnce(&mut QueueItem)) {
        if let Some(item) = self.lock_items().get_mut(index) {
            f(item);
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<QueueItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}
