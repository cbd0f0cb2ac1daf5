//! Live source connector: the trait every advertising-platform client
//! implements.

use async_trait::async_trait;
use insight_core::types::{AdAccount, Campaign, DateRange, MetricRecord};
use insight_core::InsightResult;
use serde::{Deserialize, Serialize};

/// Prefix the advertising platform gives ad account ids.
pub const ACCOUNT_ID_PREFIX: &str = "act_";

/// Granularity insights are requested at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    Account,
    Campaign,
}

impl InsightLevel {
    pub fn for_target(target_id: &str) -> Self {
        if target_id.starts_with(ACCOUNT_ID_PREFIX) {
            InsightLevel::Account
        } else {
            InsightLevel::Campaign
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightLevel::Account => "account",
            InsightLevel::Campaign => "campaign",
        }
    }
}

/// A live advertising platform.
#[async_trait]
pub trait LiveSource: Send + Sync {
    fn name(&self) -> &str;

    /// Install (or drop) the access token used for subsequent calls.
    fn set_access_token(&self, _token: Option<String>) {}

    /// Sign in and return the access token for the session.
    async fn authenticate(&self) -> InsightResult<String>;

    async fn list_accounts(&self) -> InsightResult<Vec<AdAccount>>;

    async fn list_campaigns(&self, account_id: &str) -> InsightResult<Vec<Campaign>>;

    /// Daily rows for one account or campaign, normalised to [`MetricRecord`].
    async fn get_insights(
        &self,
        target_id: &str,
        range: &DateRange,
    ) -> InsightResult<Vec<MetricRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_target_prefix() {
        assert_eq!(InsightLevel::for_target("act_123"), InsightLevel::Account);
        assert_eq!(InsightLevel::for_target("238490"), InsightLevel::Campaign);
        assert_eq!(InsightLevel::Campaign.as_str(), "campaign");
    }
}
