//! Daily breakdown table: search, sorting and CSV export over combined rows.

use insight_core::types::MetricRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const CSV_HEADER: [&str; 9] = [
    "Date",
    "Spend",
    "Clicks",
    "Impressions",
    "Messaging",
    "Leads",
    "Conversions",
    "Revenue",
    "ROAS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Date,
    Spend,
    Leads,
    Messaging,
    Conversions,
    Roas,
}

impl SortKey {
    fn compare(&self, a: &MetricRecord, b: &MetricRecord) -> Ordering {
        match self {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Spend => a.spend.total_cmp(&b.spend),
            SortKey::Leads => a.leads.cmp(&b.leads),
            SortKey::Messaging => a.messaging.cmp(&b.messaging),
            SortKey::Conversions => a.conversions.cmp(&b.conversions),
            SortKey::Roas => a.roas().total_cmp(&b.roas()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Spend => "spend",
            SortKey::Leads => "leads",
            SortKey::Messaging => "messaging",
            SortKey::Conversions => "conversions",
            SortKey::Roas => "roas",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "spend" => Ok(SortKey::Spend),
            "leads" => Ok(SortKey::Leads),
            "messaging" => Ok(SortKey::Messaging),
            "conversions" => Ok(SortKey::Conversions),
            "roas" => Ok(SortKey::Roas),
            other => Err(format!(
                "unknown sort key '{other}', expected date, spend, leads, messaging, conversions or roas"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Clicking the active ascending column flips it to descending; any
    /// other click sorts that column ascending.
    pub fn toggled(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { key, direction }
    }
}

/// Search term and sort order applied to the combined daily rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub search_term: String,
    pub sort: SortConfig,
}

impl TableView {
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = self.sort.toggled(key);
    }

    /// Filter by date substring, then stable-sort.
    pub fn apply(&self, rows: &[MetricRecord]) -> Vec<MetricRecord> {
        let needle = self.search_term.to_lowercase();
        let mut filtered: Vec<MetricRecord> = rows
            .iter()
            .filter(|row| row.date.to_string().to_lowercase().contains(&needle))
            .cloned()
            .collect();

        let SortConfig { key, direction } = self.sort;
        filtered.sort_by(|a, b| match direction {
            SortDirection::Asc => key.compare(a, b),
            SortDirection::Desc => key.compare(b, a),
        });
        filtered
    }
}

/// Render rows as CSV, currency and ROAS to two decimals.
pub fn export_csv(rows: &[MetricRecord]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for row in rows {
        lines.push(format!(
            "{},{:.2},{},{},{},{},{},{:.2},{:.2}",
            row.date,
            row.spend,
            row.clicks,
            row.impressions,
            row.messaging,
            row.leads,
            row.conversions,
            row.revenue,
            row.roas(),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(date: &str, spend: f64, revenue: f64, leads: u64) -> MetricRecord {
        MetricRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            spend,
            clicks: 0,
            impressions: 0,
            leads,
            messaging: 0,
            conversions: 0,
            revenue,
            target_id: "all".into(),
        }
    }

    #[test]
    fn test_sort_by_roas_desc() {
        let rows = vec![row("2024-01-01", 100.0, 50.0, 0), row("2024-01-02", 50.0, 200.0, 0)];
        let view = TableView {
            search_term: String::new(),
            sort: SortConfig {
                key: SortKey::Roas,
                direction: SortDirection::Desc,
            },
        };
        let sorted = view.apply(&rows);
        assert_eq!(sorted[0].date.to_string(), "2024-01-02");
        assert_eq!(sorted[1].date.to_string(), "2024-01-01");
    }

    #[test]
    fn test_zero_spend_roas_sorts_as_zero() {
        let rows = vec![row("2024-01-01", 0.0, 500.0, 0), row("2024-01-02", 10.0, 5.0, 0)];
        let view = TableView {
            search_term: String::new(),
            sort: SortConfig {
                key: SortKey::Roas,
                direction: SortDirection::Asc,
            },
        };
        let sorted = view.apply(&rows);
        assert_eq!(sorted[0].spend, 0.0);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let rows = vec![row("2024-01-01", 1.0, 0.0, 0), row("2024-01-03", 1.0, 0.0, 0)];
        let sorted = TableView::default().apply(&rows);
        assert_eq!(sorted[0].date.to_string(), "2024-01-03");
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let rows = vec![
            row("2024-01-03", 1.0, 0.0, 5),
            row("2024-01-01", 2.0, 0.0, 5),
            row("2024-01-02", 3.0, 0.0, 1),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let view = TableView {
                search_term: String::new(),
                sort: SortConfig {
                    key: SortKey::Leads,
                    direction,
                },
            };
            let sorted = view.apply(&rows);
            let tied: Vec<String> = sorted
                .iter()
                .filter(|r| r.leads == 5)
                .map(|r| r.date.to_string())
                .collect();
            assert_eq!(tied, vec!["2024-01-03", "2024-01-01"]);
        }
    }

    #[test]
    fn test_search_filters_on_date_substring() {
        let rows = vec![
            row("2024-01-15", 1.0, 0.0, 0),
            row("2024-02-15", 1.0, 0.0, 0),
            row("2024-02-16", 1.0, 0.0, 0),
        ];
        let view = TableView {
            search_term: "02-1".into(),
            ..TableView::default()
        };
        assert_eq!(view.apply(&rows).len(), 2);
        let view = TableView {
            search_term: "-15".into(),
            ..TableView::default()
        };
        assert_eq!(view.apply(&rows).len(), 2);
    }

    #[test]
    fn test_toggle_semantics() {
        let mut view = TableView::default();
        view.toggle_sort(SortKey::Date);
        assert_eq!(view.sort.direction, SortDirection::Asc);
        view.toggle_sort(SortKey::Date);
        assert_eq!(view.sort.direction, SortDirection::Desc);
        view.toggle_sort(SortKey::Spend);
        assert_eq!(
            view.sort,
            SortConfig {
                key: SortKey::Spend,
                direction: SortDirection::Asc
            }
        );
    }

    #[test]
    fn test_export_single_row() {
        let record = MetricRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            spend: 100.5,
            clicks: 10,
            impressions: 1000,
            leads: 3,
            messaging: 2,
            conversions: 1,
            revenue: 300.0,
            target_id: "act_1".into(),
        };
        let csv = export_csv(&[record]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Date,Spend,Clicks,Impressions,Messaging,Leads,Conversions,Revenue,ROAS"
        );
        assert_eq!(lines[1], "2024-01-01,100.50,10,1000,2,3,1,300.00,2.99");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_export_zero_spend_roas() {
        let csv = export_csv(&[row("2024-01-01", 0.0, 10.0, 0)]);
        assert!(csv.ends_with(",10.00,0.00"));
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("ROAS".parse::<SortKey>().unwrap(), SortKey::Roas);
        assert!("ctr".parse::<SortKey>().is_err());
    }
}
