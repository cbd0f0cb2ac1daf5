//! Performance dashboard: KPI cards and the daily series for one period.

use crate::aggregation::{combine_by_date, totals, trend};
use insight_core::types::{CalculatedMetrics, MetricRecord, RangePair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    Spend,
    Messaging,
    Leads,
    Conversions,
    Revenue,
    Roas,
}

impl Kpi {
    pub const CARDS: [Kpi; 6] = [
        Kpi::Spend,
        Kpi::Messaging,
        Kpi::Leads,
        Kpi::Conversions,
        Kpi::Revenue,
        Kpi::Roas,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Kpi::Spend => "Spend",
            Kpi::Messaging => "Messaging",
            Kpi::Leads => "Leads",
            Kpi::Conversions => "Conversions",
            Kpi::Revenue => "Revenue",
            Kpi::Roas => "ROAS",
        }
    }

    pub fn value(&self, metrics: &CalculatedMetrics) -> f64 {
        match self {
            Kpi::Spend => metrics.spend,
            Kpi::Messaging => metrics.messaging as f64,
            Kpi::Leads => metrics.leads as f64,
            Kpi::Conversions => metrics.conversions as f64,
            Kpi::Revenue => metrics.revenue,
            Kpi::Roas => metrics.roas,
        }
    }

    /// Spending more is the adverse direction; for everything else a drop is.
    fn is_adverse(&self, current: f64, previous: f64) -> bool {
        match self {
            Kpi::Spend => current > previous,
            _ => current < previous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub kpi: Kpi,
    pub label: String,
    pub value: f64,
    pub previous: f64,
    pub trend: String,
    pub comparison_label: String,
    pub is_negative: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub ranges: RangePair,
    pub daily: Vec<MetricRecord>,
    pub current: CalculatedMetrics,
    pub previous: CalculatedMetrics,
    pub cards: Vec<KpiCard>,
}

impl DashboardSnapshot {
    /// Summarise `records` (covering both periods) for `ranges`.
    pub fn build(records: &[MetricRecord], ranges: &RangePair) -> Self {
        let current = totals(records, &ranges.current);
        let previous = totals(records, &ranges.previous);

        let cards = Kpi::CARDS
            .iter()
            .map(|kpi| {
                let value = kpi.value(&current);
                let prev = kpi.value(&previous);
                KpiCard {
                    kpi: *kpi,
                    label: kpi.label().to_string(),
                    value,
                    previous: prev,
                    trend: trend(value, prev),
                    comparison_label: ranges.comparison_label.clone(),
                    is_negative: kpi.is_adverse(value, prev),
                }
            })
            .collect();

        Self {
            ranges: ranges.clone(),
            daily: combine_by_date(records, &ranges.current),
            current,
            previous,
            cards,
        }
    }

    pub fn card(&self, kpi: Kpi) -> Option<&KpiCard> {
        self.cards.iter().find(|c| c.kpi == kpi)
    }

    pub fn empty(ranges: &RangePair) -> Self {
        Self::build(&[], ranges)
    }
}
