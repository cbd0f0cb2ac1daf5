//! Fetch cycle: live source first, cached rows when it fails, one classified
//! error when both come up empty. Successful live rows are written through to
//! the cache in the background.

use insight_cache::MetricsCache;
use insight_core::types::{AdAccount, DateRange, MetricRecord, TargetScope};
use insight_core::{FetchError, InsightResult};
use insight_integrations::LiveSource;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where a fetch cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    FetchingLive,
    FetchingCache,
    Success,
    Failed,
}

/// Result of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "payload", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Rows from the live platform. May be empty when nothing ran.
    Live(Vec<MetricRecord>),
    /// Live failed, these came from the cache.
    Cached(Vec<MetricRecord>),
    /// Synthetic demo rows; never produced by [`FallbackCoordinator`].
    Mock(Vec<MetricRecord>),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn records(&self) -> &[MetricRecord] {
        match self {
            FetchOutcome::Live(r) | FetchOutcome::Cached(r) | FetchOutcome::Mock(r) => r,
            FetchOutcome::Failed(_) => &[],
        }
    }

    pub fn into_records(self) -> Vec<MetricRecord> {
        match self {
            FetchOutcome::Live(r) | FetchOutcome::Cached(r) | FetchOutcome::Mock(r) => r,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Live(_) => "live",
            FetchOutcome::Cached(_) => "cache",
            FetchOutcome::Mock(_) => "mock",
            FetchOutcome::Failed(_) => "none",
        }
    }
}

pub struct FallbackCoordinator {
    live: Arc<dyn LiveSource>,
    cache: Arc<dyn MetricsCache>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl FallbackCoordinator {
    pub fn new(live: Arc<dyn LiveSource>, cache: Arc<dyn MetricsCache>) -> Self {
        Self {
            live,
            cache,
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Run one cycle for `target` over `range`. `accounts` is the fan-out
    /// set used when the target is every account.
    pub async fn fetch(
        &self,
        target: &TargetScope,
        accounts: &[AdAccount],
        range: &DateRange,
    ) -> FetchOutcome {
        let target_id = target.id();
        debug!(target = target_id, range = %range, state = ?FetchState::FetchingLive, "Fetch cycle started");

        let err = match self.fetch_live(target, accounts, range).await {
            Ok(records) => {
                metrics::counter!("fetch.live.success").increment(1);
                if !records.is_empty() {
                    self.write_through(records.clone());
                }
                debug!(target = target_id, rows = records.len(), state = ?FetchState::Success, "Live fetch complete");
                return FetchOutcome::Live(records);
            }
            Err(err) => err,
        };

        metrics::counter!("fetch.live.failure").increment(1);
        warn!(
            target = target_id,
            error = %err,
            state = ?FetchState::FetchingCache,
            "Live fetch failed, trying cache"
        );

        let cached = self.read_cache(target_id, range).await;
        if !cached.is_empty() {
            metrics::counter!("fetch.cache.hit").increment(1);
            info!(target = target_id, rows = cached.len(), state = ?FetchState::Success, "Serving cached metrics");
            return FetchOutcome::Cached(cached);
        }

        metrics::counter!("fetch.cache.miss").increment(1);
        let classified = FetchError::classify(&err);
        warn!(target = target_id, error = %classified, state = ?FetchState::Failed, "No data available");
        FetchOutcome::Failed(classified)
    }

    /// The first failing account aborts the fan-out and drops what was
    /// already collected.
    async fn fetch_live(
        &self,
        target: &TargetScope,
        accounts: &[AdAccount],
        range: &DateRange,
    ) -> InsightResult<Vec<MetricRecord>> {
        match target {
            TargetScope::All => {
                let mut records = Vec::new();
                for account in accounts {
                    let rows = self.live.get_insights(&account.id, range).await?;
                    records.extend(rows);
                }
                Ok(records)
            }
            TargetScope::Account(id) | TargetScope::Campaign(id) => {
                self.live.get_insights(id, range).await
            }
        }
    }

    fn write_through(&self, records: Vec<MetricRecord>) {
        if !self.cache.is_configured() {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let handle = tokio::spawn(async move {
            if let Err(e) = cache.save_metrics(&records).await {
                metrics::counter!("cache.write.failure").increment(1);
                error!(error = %e, rows = records.len(), "Failed to cache live metrics");
            }
        });

        let mut pending = self.pending_writes.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    async fn read_cache(&self, target_id: &str, range: &DateRange) -> Vec<MetricRecord> {
        if !self.cache.is_configured() {
            return Vec::new();
        }
        match self
            .cache
            .get_stored_metrics(target_id, range.start_date, range.end_date)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(target = target_id, error = %e, "Cache read failed");
                Vec::new()
            }
        }
    }

    /// Wait for background cache writes still in flight.
    pub async fn flush_pending_writes(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending_writes.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Cache write task panicked");
            }
        }
    }
}
