use async_trait::async_trait;
use chrono::NaiveDate;
use insight_cache::{LocalMetricsCache, MetricsCache};
use insight_core::config::MockConfig;
use insight_core::types::{AdAccount, Campaign, DateRange, MetricRecord, TimeRange};
use insight_core::{ApiError, FetchError, InsightError, InsightResult, SessionStore};
use insight_coordinator::{DataMode, SessionController};
use insight_integrations::{LiveSource, MockGenerator};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One ad account whose insights succeed until `fail_with` holds a non-zero
/// Graph error code.
struct FlakySource {
    fail_with: AtomicI64,
}

impl FlakySource {
    fn new() -> Self {
        Self {
            fail_with: AtomicI64::new(0),
        }
    }

    fn fail(&self, code: i64) {
        self.fail_with.store(code, Ordering::SeqCst);
    }
}

#[async_trait]
impl LiveSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn authenticate(&self) -> InsightResult<String> {
        Ok("tok_flaky".into())
    }

    async fn list_accounts(&self) -> InsightResult<Vec<AdAccount>> {
        Ok(vec![AdAccount {
            id: "act_7".into(),
            name: "Flaky".into(),
            currency: "USD".into(),
        }])
    }

    async fn list_campaigns(&self, _account_id: &str) -> InsightResult<Vec<Campaign>> {
        Ok(Vec::new())
    }

    async fn get_insights(
        &self,
        target_id: &str,
        range: &DateRange,
    ) -> InsightResult<Vec<MetricRecord>> {
        let code = self.fail_with.load(Ordering::SeqCst);
        if code != 0 {
            return Err(InsightError::Api(ApiError {
                message: "Error validating access token".into(),
                code: Some(code),
                subcode: Some(463),
                error_type: Some("OAuthException".into()),
            }));
        }
        Ok(vec![MetricRecord {
            date: range.end_date,
            spend: 100.0,
            clicks: 40,
            impressions: 4000,
            leads: 4,
            messaging: 2,
            conversions: 1,
            revenue: 250.0,
            target_id: target_id.into(),
        }])
    }
}

fn controller(
    dir: &tempfile::TempDir,
    live: Arc<FlakySource>,
    cache: Arc<LocalMetricsCache>,
) -> SessionController {
    SessionController::new(
        SessionStore::new(dir.path().join("session.json")),
        live,
        cache,
        MockGenerator::new(&MockConfig::default()),
    )
    .with_today(day("2024-06-30"))
}

#[tokio::test]
async fn live_rows_are_cached_then_served_when_session_expires() {
    let dir = tempfile::tempdir().unwrap();
    let live = Arc::new(FlakySource::new());
    let cache = Arc::new(LocalMetricsCache::new());
    let mut ctl = controller(&dir, live.clone(), cache.clone());

    ctl.login().await.unwrap();
    ctl.select_account("act_7").await;
    ctl.set_time_range(TimeRange::Last7);
    assert_eq!(ctl.mode(), DataMode::Live);

    assert!(ctl.refresh().await);
    ctl.flush().await;
    assert_eq!(ctl.last_source(), "live");
    assert_eq!(cache.len(), 1);

    live.fail(190);
    assert!(ctl.refresh().await);
    assert_eq!(ctl.last_source(), "cache");
    assert!(ctl.last_error().is_none());
    let snapshot = ctl.snapshot().unwrap();
    assert_eq!(snapshot.current.spend, 100.0);
    assert_eq!(snapshot.current.roas, 2.5);
}

#[tokio::test]
async fn expired_session_without_cache_surfaces_auth_error() {
    let dir = tempfile::tempdir().unwrap();
    let live = Arc::new(FlakySource::new());
    let cache = Arc::new(LocalMetricsCache::new());
    let mut ctl = controller(&dir, live.clone(), cache);

    ctl.login().await.unwrap();
    live.fail(102);
    assert!(ctl.refresh().await);

    assert_eq!(ctl.last_error(), Some(&FetchError::AuthExpired { code: 102 }));
    assert_eq!(
        ctl.last_error().unwrap().to_string(),
        "Session expired, please sign in again"
    );
    assert_eq!(ctl.snapshot().unwrap().current.spend, 0.0);
    assert!(ctl.table_rows().is_empty());
}

#[tokio::test]
async fn aggregate_scope_falls_back_to_all_key() {
    let dir = tempfile::tempdir().unwrap();
    let live = Arc::new(FlakySource::new());
    let cache = Arc::new(LocalMetricsCache::new());
    let mut all_rows = MetricRecord::empty(day("2024-06-29"), "all");
    all_rows.spend = 42.0;
    cache.save_metrics(&[all_rows]).await.unwrap();

    let mut ctl = controller(&dir, live.clone(), cache);
    ctl.login().await.unwrap();
    live.fail(2);
    ctl.refresh().await;

    assert_eq!(ctl.last_source(), "cache");
    assert_eq!(ctl.snapshot().unwrap().current.spend, 42.0);
}

#[tokio::test]
async fn superseded_cycle_does_not_overwrite_newer_state() {
    let dir = tempfile::tempdir().unwrap();
    let live = Arc::new(FlakySource::new());
    let cache = Arc::new(LocalMetricsCache::new());
    let mut ctl = controller(&dir, live.clone(), cache);
    ctl.login().await.unwrap();

    let first = ctl.begin_fetch();
    ctl.set_time_range(TimeRange::Today);
    let second = ctl.begin_fetch();

    let second_outcome = ctl.run_fetch(&second).await;
    let first_outcome = ctl.run_fetch(&first).await;
    assert!(ctl.complete(&second, second_outcome));
    assert!(!ctl.complete(&first, first_outcome));

    let snapshot = ctl.snapshot().unwrap();
    assert_eq!(snapshot.ranges.current.num_days(), 1);
    assert_eq!(snapshot.ranges.comparison_label, "vs. yesterday");
}
