//! Insight row normalisation: maps the platform's free-form action lists
//! onto the fixed metric fields.

use chrono::NaiveDate;
use insight_core::types::MetricRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// How an action type string is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMatch {
    Exact(&'static str),
    Contains(&'static str),
}

impl ActionMatch {
    pub fn matches(&self, action_type: &str) -> bool {
        match self {
            ActionMatch::Exact(expected) => action_type == *expected,
            ActionMatch::Contains(fragment) => action_type.contains(fragment),
        }
    }
}

/// Which list of the insight row an action is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionList {
    /// Counts (`actions`).
    Actions,
    /// Monetary values (`action_values`).
    ActionValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Leads,
    Messaging,
    Conversions,
    Revenue,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionMapping {
    pub pattern: ActionMatch,
    pub list: ActionList,
    pub field: MetricField,
}

pub const ACTION_MAPPINGS: &[ActionMapping] = &[
    ActionMapping {
        pattern: ActionMatch::Exact("lead"),
        list: ActionList::Actions,
        field: MetricField::Leads,
    },
    ActionMapping {
        pattern: ActionMatch::Exact("registration"),
        list: ActionList::Actions,
        field: MetricField::Leads,
    },
    ActionMapping {
        pattern: ActionMatch::Contains("messaging_conversation_started"),
        list: ActionList::Actions,
        field: MetricField::Messaging,
    },
    ActionMapping {
        pattern: ActionMatch::Exact("purchase"),
        list: ActionList::Actions,
        field: MetricField::Conversions,
    },
    ActionMapping {
        pattern: ActionMatch::Exact("purchase"),
        list: ActionList::ActionValues,
        field: MetricField::Revenue,
    },
];

#[derive(Debug, Clone, Deserialize)]
pub struct ActionEntry {
    pub action_type: String,
    #[serde(default)]
    pub value: Value,
}

/// One day of an insights response as the platform sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightRow {
    pub date_start: String,
    #[serde(default)]
    pub spend: Value,
    #[serde(default)]
    pub clicks: Value,
    #[serde(default)]
    pub impressions: Value,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(default)]
    pub action_values: Vec<ActionEntry>,
}

/// Numbers arrive as strings; anything unparseable counts as zero.
pub fn lenient_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn lenient_u64(value: &Value) -> u64 {
    if let Value::String(s) = value {
        if let Ok(n) = s.trim().parse::<u64>() {
            return n;
        }
    }
    if let Value::Number(n) = value {
        if let Some(n) = n.as_u64() {
            return n;
        }
    }
    let v = lenient_f64(value);
    if v > 0.0 {
        v.trunc() as u64
    } else {
        0
    }
}

fn sum_matching(entries: &[ActionEntry], pattern: ActionMatch) -> f64 {
    entries
        .iter()
        .filter(|a| pattern.matches(&a.action_type))
        .map(|a| lenient_f64(&a.value))
        .sum()
}

impl InsightRow {
    /// Normalise into a [`MetricRecord`] for `target_id`. Rows without a
    /// parseable date are dropped.
    pub fn normalize(&self, target_id: &str) -> Option<MetricRecord> {
        let date = match NaiveDate::parse_from_str(self.date_start.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(date_start = %self.date_start, error = %e, "Skipping insight row with bad date");
                return None;
            }
        };

        let mut record = MetricRecord::empty(date, target_id);
        record.spend = lenient_f64(&self.spend);
        record.clicks = lenient_u64(&self.clicks);
        record.impressions = lenient_u64(&self.impressions);

        for mapping in ACTION_MAPPINGS {
            let entries = match mapping.list {
                ActionList::Actions => &self.actions,
                ActionList::ActionValues => &self.action_values,
            };
            let amount = sum_matching(entries, mapping.pattern);
            match mapping.field {
                MetricField::Leads => record.leads += amount as u64,
                MetricField::Messaging => record.messaging += amount as u64,
                MetricField::Conversions => record.conversions += amount as u64,
                MetricField::Revenue => record.revenue += amount,
            }
        }

        Some(record)
    }
}
