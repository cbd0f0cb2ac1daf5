use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire identifier of the aggregate "every target" scope.
pub const ALL_TARGETS: &str = "all";

/// One day of delivery for one target (account or campaign).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub spend: f64,
    pub clicks: u64,
    pub impressions: u64,
    pub leads: u64,
    pub messaging: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub target_id: String,
}

impl MetricRecord {
    /// A zeroed record for `target_id` on `date`.
    pub fn empty(date: NaiveDate, target_id: impl Into<String>) -> Self {
        Self {
            date,
            spend: 0.0,
            clicks: 0,
            impressions: 0,
            leads: 0,
            messaging: 0,
            conversions: 0,
            revenue: 0.0,
            target_id: target_id.into(),
        }
    }

    /// Add every additive field of `other` into `self`.
    pub fn accumulate(&mut self, other: &MetricRecord) {
        self.spend += other.spend;
        self.clicks += other.clicks;
        self.impressions += other.impressions;
        self.leads += other.leads;
        self.messaging += other.messaging;
        self.conversions += other.conversions;
        self.revenue += other.revenue;
    }

    /// Return on ad spend for this row, 0 when nothing was spent.
    pub fn roas(&self) -> f64 {
        if self.spend > 0.0 {
            self.revenue / self.spend
        } else {
            0.0
        }
    }
}

/// Inclusive calendar-day interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days covered, counting both ends. Zero or negative for an
    /// inverted range.
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// The range of `days` days that ends the day before this one starts.
    pub fn preceding(&self, days: i64) -> DateRange {
        let end_date = self.start_date - Duration::days(1);
        let start_date = end_date - Duration::days(days.max(1) - 1);
        DateRange {
            start_date,
            end_date,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_date, self.end_date)
    }
}

/// Current period, the period it is compared against, and the label shown
/// next to trend figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePair {
    pub current: DateRange,
    pub previous: DateRange,
    pub comparison_label: String,
}

impl RangePair {
    /// One range covering both periods, so a single fetch serves both.
    pub fn extended(&self) -> DateRange {
        DateRange::new(self.previous.start_date, self.current.end_date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last-7")]
    Last7,
    #[default]
    #[serde(rename = "last-30")]
    Last30,
    #[serde(rename = "previous-month")]
    PreviousMonth,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "custom")]
    Custom,
}

impl TimeRange {
    pub const ALL: [TimeRange; 6] = [
        TimeRange::Today,
        TimeRange::Last7,
        TimeRange::Last30,
        TimeRange::PreviousMonth,
        TimeRange::Year,
        TimeRange::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Last7 => "last-7",
            TimeRange::Last30 => "last-30",
            TimeRange::PreviousMonth => "previous-month",
            TimeRange::Year => "year",
            TimeRange::Custom => "custom",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown time range '{s}', expected one of: today, last-7, last-30, previous-month, year, custom"
                )
            })
    }
}

/// What a fetch cycle is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum TargetScope {
    All,
    Account(String),
    Campaign(String),
}

impl TargetScope {
    /// A selected campaign wins over a selected account; `"all"` in both
    /// positions means every account.
    pub fn resolve(account_id: &str, campaign_id: &str) -> Self {
        if campaign_id != ALL_TARGETS {
            TargetScope::Campaign(campaign_id.to_string())
        } else if account_id != ALL_TARGETS {
            TargetScope::Account(account_id.to_string())
        } else {
            TargetScope::All
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TargetScope::All => ALL_TARGETS,
            TargetScope::Account(id) | TargetScope::Campaign(id) => id,
        }
    }
}

impl fmt::Display for TargetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Grand totals over a period plus ratios derived from those totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatedMetrics {
    pub spend: f64,
    pub clicks: u64,
    pub impressions: u64,
    pub leads: u64,
    pub messaging: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpa: f64,
    pub cpl: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdAccount {
    pub id: String,
    pub name: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub account_id: String,
}

/// Signed-in dashboard user. Holding an access token switches the session to
/// live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl User {
    pub fn is_live(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
