//! In-process metrics store backed by DashMap for lock-free concurrent access.
//! Used when no remote cache is deployed and as the store in tests.

use crate::store::MetricsCache;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use insight_core::types::MetricRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct LocalMetricsCache {
    store: Arc<DashMap<String, BTreeMap<NaiveDate, MetricRecord>>>,
}

impl LocalMetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored rows across all targets.
    pub fn len(&self) -> usize {
        self.store.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetricsCache for LocalMetricsCache {
    fn is_configured(&self) -> bool {
        true
    }

    async fn save_metrics(&self, records: &[MetricRecord]) -> anyhow::Result<()> {
        for record in records {
            self.store
                .entry(record.target_id.clone())
                .or_default()
                .insert(record.date, record.clone());
        }
        Ok(())
    }

    async fn get_stored_metrics(
        &self,
        target_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        let Some(rows) = self.store.get(target_id) else {
            return Ok(Vec::new());
        };
        if start_date > end_date {
            return Ok(Vec::new());
        }
        Ok(rows
            .range(start_date..=end_date)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
