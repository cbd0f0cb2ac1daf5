//! Redis-backed metrics store.
//! One hash per target (`{prefix}:{target_id}`), field = ISO date, value =
//! JSON record, so re-saving a day overwrites it.

use crate::store::MetricsCache;
use async_trait::async_trait;
use chrono::NaiveDate;
use insight_core::config::CacheConfig;
use insight_core::types::MetricRecord;
use redis::AsyncCommands;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub struct RedisMetricsCache {
    client: Option<redis::Client>,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisMetricsCache {
    /// Build the client. Nothing is dialled until the first command; an
    /// unset URL leaves the cache unconfigured.
    pub fn new(config: &CacheConfig) -> anyhow::Result<Self> {
        let client = match config.redis_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                info!(url = %url, "Using Redis metrics cache");
                Some(redis::Client::open(url)?)
            }
            _ => {
                info!("Metrics cache not configured, fallback disabled");
                None
            }
        };

        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
            ttl_secs: config.ttl_secs,
        })
    }

    fn key(&self, target_id: &str) -> String {
        format!("{}:{target_id}", self.key_prefix)
    }
}

#[async_trait]
impl MetricsCache for RedisMetricsCache {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn save_metrics(&self, records: &[MetricRecord]) -> anyhow::Result<()> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        if records.is_empty() {
            return Ok(());
        }

        let mut by_target: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
        for record in records {
            by_target
                .entry(record.target_id.as_str())
                .or_default()
                .push((record.date.to_string(), serde_json::to_string(record)?));
        }

        let mut conn = client.get_multiplexed_async_connection().await?;
        let mut pipe = redis::pipe();
        for (target_id, fields) in &by_target {
            let key = self.key(target_id);
            pipe.hset_multiple(&key, fields.as_slice()).ignore();
            pipe.expire(&key, self.ttl_secs as i64).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn).await?;

        metrics::counter!("cache.rows_written").increment(records.len() as u64);
        debug!(rows = records.len(), targets = by_target.len(), "Metrics cached");
        Ok(())
    }

    async fn get_stored_metrics(
        &self,
        target_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        let Some(client) = &self.client else {
            return Ok(Vec::new());
        };

        let mut conn = client.get_multiplexed_async_connection().await?;
        let stored: HashMap<String, String> = conn.hgetall(self.key(target_id)).await?;

        let mut rows: Vec<MetricRecord> = stored
            .into_values()
            .filter_map(|json| match serde_json::from_str::<MetricRecord>(&json) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(target = target_id, error = %e, "Skipping unreadable cached row");
                    None
                }
            })
            .filter(|m| m.date >= start_date && m.date <= end_date)
            .collect();
        rows.sort_by_key(|m| m.date);

        debug!(target = target_id, rows = rows.len(), "Cached metrics read");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_is_noop() {
        let cache = RedisMetricsCache::new(&CacheConfig::default()).unwrap();
        assert!(!cache.is_configured());
        cache
            .save_metrics(&[MetricRecord::empty(day("2024-01-01"), "act_1")])
            .await
            .unwrap();
        let rows = cache
            .get_stored_metrics("act_1", day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_configured_without_dialling() {
        let cache = RedisMetricsCache::new(&CacheConfig {
            redis_url: Some("redis://127.0.0.1:6379".into()),
            ..CacheConfig::default()
        })
        .unwrap();
        assert!(cache.is_configured());
        assert_eq!(cache.key("act_1"), "ad_insights:act_1");
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let result = RedisMetricsCache::new(&CacheConfig {
            redis_url: Some("not a url".into()),
            ..CacheConfig::default()
        });
        assert!(result.is_err());
    }
}
