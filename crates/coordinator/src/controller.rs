//! Session controller: owns the persisted session, the account/campaign
//! lists, the table view and the last applied dashboard snapshot, and runs
//! fetch cycles guarded by a generation token.

use crate::fallback::{FallbackCoordinator, FetchOutcome};
use chrono::{NaiveDate, Utc};
use insight_cache::MetricsCache;
use insight_core::types::{
    AdAccount, Campaign, DateRange, MetricRecord, RangePair, TargetScope, TimeRange, User,
    ALL_TARGETS,
};
use insight_core::{FetchError, SessionState, SessionStore};
use insight_integrations::{mock_accounts, mock_campaigns, LiveSource, MockGenerator};
use insight_reporting::{calculate_ranges, export_csv, DashboardSnapshot, SortConfig, SortKey, TableView};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const LIVE_USER_NAME: &str = "Facebook User";
const LIVE_USER_EMAIL: &str = "fb-connected@adsinsight.io";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    Live,
    Mock,
}

/// Everything a fetch cycle needs, captured when the cycle starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub mode: DataMode,
    pub target: TargetScope,
    pub ranges: RangePair,
}

pub struct SessionController {
    store: SessionStore,
    state: SessionState,
    live: Arc<dyn LiveSource>,
    coordinator: FallbackCoordinator,
    mock: MockGenerator,
    accounts: Vec<AdAccount>,
    campaigns: Vec<Campaign>,
    generation: u64,
    table: TableView,
    snapshot: Option<DashboardSnapshot>,
    source: &'static str,
    last_error: Option<FetchError>,
    today: Option<NaiveDate>,
}

impl SessionController {
    /// Restore the saved session. A saved live user gets its token handed
    /// back to the live source.
    pub fn new(
        store: SessionStore,
        live: Arc<dyn LiveSource>,
        cache: Arc<dyn MetricsCache>,
        mock: MockGenerator,
    ) -> Self {
        let state = store.load();
        if state.is_live() {
            live.set_access_token(state.user.as_ref().and_then(|u| u.access_token.clone()));
        }
        info!(
            source = live.name(),
            live = state.is_live(),
            path = %store.path().display(),
            "Session restored"
        );

        Self {
            store,
            state,
            coordinator: FallbackCoordinator::new(Arc::clone(&live), cache),
            live,
            mock,
            accounts: Vec::new(),
            campaigns: Vec::new(),
            generation: 0,
            table: TableView::default(),
            snapshot: None,
            source: "none",
            last_error: None,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn mode(&self) -> DataMode {
        if self.state.is_live() {
            DataMode::Live
        } else {
            DataMode::Mock
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ─── Accounts & campaigns ───────────────────────────────────────

    pub fn active_accounts(&self) -> Vec<AdAccount> {
        match self.mode() {
            DataMode::Live => self.accounts.clone(),
            DataMode::Mock => mock_accounts(),
        }
    }

    pub fn active_campaigns(&self) -> Vec<Campaign> {
        let account_id = self.state.selected_account_id.as_str();
        match self.mode() {
            DataMode::Live if account_id == ALL_TARGETS => Vec::new(),
            DataMode::Live => self.campaigns.clone(),
            DataMode::Mock => mock_campaigns()
                .into_iter()
                .filter(|c| account_id == ALL_TARGETS || c.account_id == account_id)
                .collect(),
        }
    }

    /// Reload the live account list, then the selected account's campaigns.
    /// Failures are logged and leave the previous lists in place.
    pub async fn load_accounts(&mut self) {
        if self.mode() != DataMode::Live {
            return;
        }
        match self.live.list_accounts().await {
            Ok(accounts) => {
                if accounts.is_empty() {
                    warn!("Signed-in user has no ad accounts");
                }
                info!(count = accounts.len(), "Ad accounts loaded");
                self.accounts = accounts;
            }
            Err(e) => error!(error = %e, "Failed to load ad accounts"),
        }
        self.load_campaigns().await;
    }

    pub async fn load_campaigns(&mut self) {
        let account_id = self.state.selected_account_id.clone();
        if self.mode() != DataMode::Live || account_id == ALL_TARGETS {
            self.campaigns.clear();
            return;
        }
        match self.live.list_campaigns(&account_id).await {
            Ok(campaigns) => {
                debug!(account = %account_id, count = campaigns.len(), "Campaigns loaded");
                self.campaigns = campaigns;
            }
            Err(e) => error!(account = %account_id, error = %e, "Failed to load campaigns"),
        }
    }

    // ─── Sign-in ────────────────────────────────────────────────────

    pub async fn login(&mut self) -> Result<&User, FetchError> {
        let token = match self.live.authenticate().await {
            Ok(token) => token,
            Err(e) => {
                let classified = FetchError::classify(&e);
                warn!(error = %classified, "Live sign-in failed");
                return Err(classified);
            }
        };

        self.live.set_access_token(Some(token.clone()));
        self.state.user = Some(User {
            id: format!("fb_{}", Utc::now().timestamp_millis()),
            email: LIVE_USER_EMAIL.to_string(),
            name: LIVE_USER_NAME.to_string(),
            access_token: Some(token),
        });
        self.invalidate();
        self.persist();
        info!(source = self.live.name(), "Signed in");

        self.load_accounts().await;
        self.state
            .user
            .as_ref()
            .ok_or_else(|| FetchError::SdkUnavailable {
                message: "Sign-in did not produce a user".into(),
            })
    }

    pub fn logout(&mut self) {
        self.state.reset();
        self.live.set_access_token(None);
        self.accounts.clear();
        self.campaigns.clear();
        self.snapshot = None;
        self.source = "none";
        self.last_error = None;
        self.invalidate();
        if let Err(e) = self.store.clear() {
            warn!(path = %self.store.path().display(), error = %e, "Failed to clear session state");
        }
        info!("Signed out");
    }

    // ─── Filters ────────────────────────────────────────────────────

    pub async fn select_account(&mut self, account_id: &str) {
        self.state.selected_account_id = account_id.to_string();
        self.invalidate();
        self.persist();
        self.load_campaigns().await;
    }

    pub fn select_campaign(&mut self, campaign_id: &str) {
        self.state.selected_campaign_id = campaign_id.to_string();
        self.invalidate();
        self.persist();
    }

    pub fn set_time_range(&mut self, mode: TimeRange) {
        self.state.time_range = mode;
        self.invalidate();
        self.persist();
    }

    pub fn set_custom_range(&mut self, range: DateRange) {
        self.state.custom_range = Some(range);
        self.invalidate();
        self.persist();
    }

    pub fn ranges(&self) -> RangePair {
        let today = self.today();
        calculate_ranges(
            self.state.time_range,
            self.state.custom_range_or_default(today),
            today,
        )
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            warn!(path = %self.store.path().display(), error = %e, "Failed to persist session state");
        }
    }

    // ─── Fetch cycle ────────────────────────────────────────────────

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            mode: self.mode(),
            target: TargetScope::resolve(
                &self.state.selected_account_id,
                &self.state.selected_campaign_id,
            ),
            ranges: self.ranges(),
        }
    }

    pub async fn run_fetch(&self, ticket: &FetchTicket) -> FetchOutcome {
        match ticket.mode {
            DataMode::Live => {
                self.coordinator
                    .fetch(&ticket.target, &self.accounts, &ticket.ranges.extended())
                    .await
            }
            DataMode::Mock => FetchOutcome::Mock(self.mock_records()),
        }
    }

    fn mock_records(&self) -> Vec<MetricRecord> {
        let today = self.today();
        let campaign_id = self.state.selected_campaign_id.as_str();
        self.active_campaigns()
            .iter()
            .filter(|c| campaign_id == ALL_TARGETS || c.id == campaign_id)
            .flat_map(|c| self.mock.generate(&c.id, today))
            .collect()
    }

    /// Apply an outcome if its ticket is still current. Returns false when
    /// the outcome was discarded as stale.
    pub fn complete(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> bool {
        if ticket.generation != self.generation {
            metrics::counter!("fetch.stale_discarded").increment(1);
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale fetch"
            );
            return false;
        }

        self.source = outcome.source();
        self.last_error = outcome.error().cloned();
        let records = outcome.into_records();
        info!(
            target = %ticket.target,
            source = self.source,
            rows = records.len(),
            failed = self.last_error.is_some(),
            "Fetch cycle applied"
        );
        self.snapshot = Some(DashboardSnapshot::build(&records, &ticket.ranges));
        true
    }

    /// Run one full cycle for the current filters.
    pub async fn refresh(&mut self) -> bool {
        let ticket = self.begin_fetch();
        let outcome = self.run_fetch(&ticket).await;
        self.complete(&ticket, outcome)
    }

    /// Wait for cache writes spawned by earlier cycles.
    pub async fn flush(&self) {
        self.coordinator.flush_pending_writes().await;
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// `live`, `cache`, `mock`, or `none` before the first applied cycle and
    /// after a failed one.
    pub fn last_source(&self) -> &'static str {
        self.source
    }

    // ─── Table ──────────────────────────────────────────────────────

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn set_search(&mut self, term: &str) {
        self.table.search_term = term.to_string();
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.table.toggle_sort(key);
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        self.table.sort = sort;
    }

    pub fn table_rows(&self) -> Vec<MetricRecord> {
        self.snapshot
            .as_ref()
            .map(|s| self.table.apply(&s.daily))
            .unwrap_or_default()
    }

    pub fn export_csv(&self) -> String {
        export_csv(&self.table_rows())
    }
}
