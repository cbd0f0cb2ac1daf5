//! Test doubles shared by the unit tests in this crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use insight_cache::MetricsCache;
use insight_core::types::{AdAccount, Campaign, DateRange, MetricRecord};
use insight_core::{ApiError, InsightError, InsightResult};
use insight_integrations::LiveSource;
use parking_lot::Mutex;
use std::collections::HashMap;

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn rec(date: &str, target: &str, spend: f64) -> MetricRecord {
    let mut m = MetricRecord::empty(day(date), target);
    m.spend = spend;
    m.clicks = 10;
    m
}

enum Scripted {
    Rows(Vec<MetricRecord>),
    Api(ApiError),
}

/// Live source answering from a per-target script. Unscripted targets
/// return no rows.
#[derive(Default)]
pub struct ScriptedSource {
    insights: HashMap<String, Scripted>,
    accounts: Vec<AdAccount>,
    campaigns: Vec<Campaign>,
    login: Option<String>,
    calls: Mutex<Vec<String>>,
    token: Mutex<Option<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, target: &str, rows: Vec<MetricRecord>) -> Self {
        self.insights.insert(target.into(), Scripted::Rows(rows));
        self
    }

    pub fn with_api_error(mut self, target: &str, code: i64, message: &str) -> Self {
        self.insights.insert(
            target.into(),
            Scripted::Api(ApiError {
                message: message.into(),
                code: Some(code),
                subcode: None,
                error_type: Some("OAuthException".into()),
            }),
        );
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<AdAccount>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_campaigns(mut self, campaigns: Vec<Campaign>) -> Self {
        self.campaigns = campaigns;
        self
    }

    pub fn with_login(mut self, token: &str) -> Self {
        self.login = Some(token.into());
        self
    }

    /// Targets `get_insights` was called with, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl LiveSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.lock() = token;
    }

    async fn authenticate(&self) -> InsightResult<String> {
        match &self.login {
            Some(token) => {
                self.set_access_token(Some(token.clone()));
                Ok(token.clone())
            }
            None => Err(InsightError::LoginUnavailable(
                "Live sign-in is not configured".into(),
            )),
        }
    }

    async fn list_accounts(&self) -> InsightResult<Vec<AdAccount>> {
        Ok(self.accounts.clone())
    }

    async fn list_campaigns(&self, account_id: &str) -> InsightResult<Vec<Campaign>> {
        Ok(self
            .campaigns
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn get_insights(
        &self,
        target_id: &str,
        _range: &DateRange,
    ) -> InsightResult<Vec<MetricRecord>> {
        self.calls.lock().push(target_id.to_string());
        match self.insights.get(target_id) {
            Some(Scripted::Rows(rows)) => Ok(rows.clone()),
            Some(Scripted::Api(api)) => Err(InsightError::Api(api.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Configured cache whose every call fails.
pub struct FailingCache;

#[async_trait]
impl MetricsCache for FailingCache {
    fn is_configured(&self) -> bool {
        true
    }

    async fn save_metrics(&self, _records: &[MetricRecord]) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn get_stored_metrics(
        &self,
        _target_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        anyhow::bail!("connection refused")
    }
}
