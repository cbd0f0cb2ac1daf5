//! Meta Graph Marketing API client.
//!
//! Every call is a GET against `{base_url}/{api_version}/{endpoint}` with the
//! session's access token as a query parameter. A JSON body carrying an
//! `error` object is a rejection and is surfaced as [`InsightError::Api`].

use crate::actions::InsightRow;
use crate::connector::{InsightLevel, LiveSource};
use async_trait::async_trait;
use insight_core::config::GraphApiConfig;
use insight_core::error::ApiError;
use insight_core::types::{AdAccount, Campaign, DateRange, MetricRecord};
use insight_core::{InsightError, InsightResult};
use parking_lot::RwLock;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on `paging.next` hops for a single listing.
const MAX_PAGES: usize = 100;

const INSIGHT_FIELDS: &str = "date_start,spend,clicks,impressions,actions,action_values";

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

impl From<RawAccount> for AdAccount {
    fn from(raw: RawAccount) -> Self {
        let name = match raw.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => format!("ID: {}", raw.account_id.as_deref().unwrap_or(&raw.id)),
        };
        AdAccount {
            id: raw.id,
            name,
            currency: raw.currency.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCampaign {
    id: String,
    #[serde(default)]
    name: String,
}

pub struct GraphApiClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    campaign_limit: u32,
    login_token: Option<String>,
    access_token: RwLock<Option<String>>,
}

impl GraphApiClient {
    pub fn new(config: &GraphApiConfig) -> InsightResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| InsightError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            campaign_limit: config.campaign_limit,
            login_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
            access_token: RwLock::new(None),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, endpoint)
    }

    fn token(&self) -> InsightResult<String> {
        self.access_token
            .read()
            .clone()
            .ok_or(InsightError::Unauthorized)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> InsightResult<Value> {
        metrics::counter!("graph.requests").increment(1);
        let response = request
            .send()
            .await
            .map_err(|e| InsightError::Transport(e.to_string()))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| InsightError::Transport(format!("HTTP {status}: {e}")))?;
        decode_body(status, body)
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> InsightResult<Value> {
        let token = self.token()?;
        debug!(endpoint = endpoint, "Calling Graph API");
        let request = self
            .http
            .get(self.endpoint_url(endpoint))
            .query(params)
            .query(&[("access_token", token)]);
        self.send(request).await
    }

    /// Collect `data` across every page of a listing.
    async fn get_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> InsightResult<Vec<T>> {
        let mut page: Page<T> = serde_json::from_value(self.get(endpoint, params).await?)?;
        let mut items = std::mem::take(&mut page.data);

        let mut hops = 0;
        while let Some(next) = page.paging.and_then(|p| p.next) {
            hops += 1;
            if hops > MAX_PAGES {
                warn!(endpoint = endpoint, hops = hops - 1, "Pagination limit reached, results truncated");
                break;
            }
            page = serde_json::from_value(self.send(self.http.get(next)).await?)?;
            items.append(&mut page.data);
        }
        Ok(items)
    }
}

/// Turn a response body into either its payload or the API's rejection.
fn decode_body(status: StatusCode, mut body: Value) -> InsightResult<Value> {
    if let Some(error) = body.get_mut("error").map(Value::take) {
        let api: ApiError = serde_json::from_value(error).unwrap_or_else(|_| ApiError {
            message: format!("HTTP {status}"),
            ..ApiError::default()
        });
        return Err(InsightError::Api(api));
    }
    if !status.is_success() {
        return Err(InsightError::Transport(format!("HTTP {status}")));
    }
    Ok(body)
}

/// Sign-in needs TLS except against a local endpoint.
fn check_transport(base_url: &str) -> InsightResult<()> {
    let url = Url::parse(base_url)
        .map_err(|e| InsightError::LoginUnavailable(format!("Invalid API base URL: {e}")))?;
    let local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
    if url.scheme() != "https" && !local {
        return Err(InsightError::LoginUnavailable(
            "The advertising platform requires an HTTPS connection for sign-in".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl LiveSource for GraphApiClient {
    fn name(&self) -> &str {
        "meta_graph_api"
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token.filter(|t| !t.is_empty());
    }

    async fn authenticate(&self) -> InsightResult<String> {
        check_transport(&self.base_url)?;
        let token = self.login_token.clone().ok_or_else(|| {
            InsightError::LoginUnavailable(
                "Live sign-in is not configured, set ADS_INSIGHT__GRAPH__ACCESS_TOKEN".to_string(),
            )
        })?;

        self.set_access_token(Some(token.clone()));
        if let Err(e) = self.get("me", &[("fields", "id".to_string())]).await {
            self.set_access_token(None);
            return Err(e);
        }
        info!(source = self.name(), "Signed in to advertising platform");
        Ok(token)
    }

    async fn list_accounts(&self) -> InsightResult<Vec<AdAccount>> {
        let raw: Vec<RawAccount> = self
            .get_all(
                "me/adaccounts",
                &[("fields", "name,account_id,currency".to_string())],
            )
            .await?;
        Ok(raw.into_iter().map(AdAccount::from).collect())
    }

    async fn list_campaigns(&self, account_id: &str) -> InsightResult<Vec<Campaign>> {
        let value = self
            .get(
                &format!("{account_id}/campaigns"),
                &[
                    ("fields", "name,id".to_string()),
                    ("limit", self.campaign_limit.to_string()),
                ],
            )
            .await?;
        let page: Page<RawCampaign> = serde_json::from_value(value)?;
        Ok(page
            .data
            .into_iter()
            .map(|c| Campaign {
                id: c.id,
                name: c.name,
                account_id: account_id.to_string(),
            })
            .collect())
    }

    async fn get_insights(
        &self,
        target_id: &str,
        range: &DateRange,
    ) -> InsightResult<Vec<MetricRecord>> {
        let time_range = serde_json::json!({
            "since": range.start_date.to_string(),
            "until": range.end_date.to_string(),
        });
        let rows: Vec<InsightRow> = self
            .get_all(
                &format!("{target_id}/insights"),
                &[
                    ("fields", INSIGHT_FIELDS.to_string()),
                    ("time_range", time_range.to_string()),
                    ("time_increment", "1".to_string()),
                    ("level", InsightLevel::for_target(target_id).as_str().to_string()),
                ],
            )
            .await?;

        let records: Vec<MetricRecord> = rows
            .iter()
            .filter_map(|row| row.normalize(target_id))
            .collect();
        debug!(target = target_id, rows = records.len(), "Insights fetched");
        Ok(records)
    }
}
