//! Fallback store for daily metrics. Live fetches are written through to it
//! and it is read back when the live source is unavailable.

use async_trait::async_trait;
use chrono::NaiveDate;
use insight_core::types::MetricRecord;

#[async_trait]
pub trait MetricsCache: Send + Sync {
    /// An unconfigured cache ignores writes and reads back nothing.
    fn is_configured(&self) -> bool;

    /// Upsert records keyed by `(target_id, date)`.
    async fn save_metrics(&self, records: &[MetricRecord]) -> anyhow::Result<()>;

    /// Stored rows for `target_id` between the two dates (inclusive),
    /// oldest first.
    async fn get_stored_metrics(
        &self,
        target_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRecord>>;
}
