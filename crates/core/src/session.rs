//! Persisted dashboard session: who is signed in and which filters are active.

use crate::error::InsightResult;
use crate::types::{DateRange, TimeRange, User, ALL_TARGETS};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Days covered by the custom range before the user picks one.
const DEFAULT_CUSTOM_SPAN_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default = "default_selection")]
    pub selected_account_id: String,
    #[serde(default = "default_selection")]
    pub selected_campaign_id: String,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub custom_range: Option<DateRange>,
}

fn default_selection() -> String {
    ALL_TARGETS.to_string()
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            selected_account_id: default_selection(),
            selected_campaign_id: default_selection(),
            time_range: TimeRange::default(),
            custom_range: None,
        }
    }
}

impl SessionState {
    /// The custom range, or the last thirty days ending `today` when none
    /// has been chosen yet.
    pub fn custom_range_or_default(&self, today: NaiveDate) -> DateRange {
        self.custom_range.unwrap_or_else(|| {
            DateRange::new(today - Duration::days(DEFAULT_CUSTOM_SPAN_DAYS), today)
        })
    }

    pub fn is_live(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_live)
    }

    /// Drop the user and every filter back to its default.
    pub fn reset(&mut self) {
        *self = SessionState::default();
    }
}

/// JSON file backing for [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file yields the default state.
    pub fn load(&self) -> SessionState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved session, starting fresh");
                return SessionState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session state");
                return SessionState::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Discarding corrupt session state");
            SessionState::default()
        })
    }

    pub fn save(&self, state: &SessionState) -> InsightResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> InsightResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
