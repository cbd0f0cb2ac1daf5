//! Metrics aggregation: collapses per-target daily rows into one row per
//! date and derives period KPIs from grand totals.

use insight_core::types::{CalculatedMetrics, DateRange, MetricRecord, ALL_TARGETS};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total order used to sum floats identically whatever order the caller
/// supplied the rows in.
fn canonical(a: &MetricRecord, b: &MetricRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.target_id.cmp(&b.target_id))
        .then_with(|| a.spend.total_cmp(&b.spend))
        .then_with(|| a.revenue.total_cmp(&b.revenue))
        .then_with(|| a.clicks.cmp(&b.clicks))
}

fn in_range<'a>(records: &'a [MetricRecord], range: &DateRange) -> Vec<&'a MetricRecord> {
    let mut items: Vec<&MetricRecord> = records.iter().filter(|m| range.contains(m.date)).collect();
    items.sort_by(|a, b| canonical(a, b));
    items
}

/// One record per calendar date inside `range`, ascending, every additive
/// field summed across targets.
pub fn combine_by_date(records: &[MetricRecord], range: &DateRange) -> Vec<MetricRecord> {
    let mut combined: BTreeMap<_, MetricRecord> = BTreeMap::new();

    for m in in_range(records, range) {
        combined
            .entry(m.date)
            .and_modify(|row| {
                row.accumulate(m);
                if row.target_id != m.target_id {
                    row.target_id = ALL_TARGETS.to_string();
                }
            })
            .or_insert_with(|| m.clone());
    }

    combined.into_values().collect()
}

/// Grand totals inside `range` and the ratios derived from them.
pub fn totals(records: &[MetricRecord], range: &DateRange) -> CalculatedMetrics {
    let mut sum = CalculatedMetrics::default();
    for m in in_range(records, range) {
        sum.spend += m.spend;
        sum.clicks += m.clicks;
        sum.impressions += m.impressions;
        sum.leads += m.leads;
        sum.messaging += m.messaging;
        sum.conversions += m.conversions;
        sum.revenue += m.revenue;
    }

    CalculatedMetrics {
        ctr: ratio(sum.clicks as f64, sum.impressions as f64) * 100.0,
        cpc: ratio(sum.spend, sum.clicks as f64),
        cpa: ratio(sum.spend, sum.conversions as f64),
        cpl: ratio(sum.spend, sum.leads as f64),
        roas: ratio(sum.revenue, sum.spend),
        ..sum
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Period-over-period change, e.g. `+12.5%`, `-50.0%`.
pub fn trend(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return if current > 0.0 { "+100%" } else { "0%" }.to_string();
    }
    let diff = (current - previous) / previous * 100.0;
    if diff >= 0.0 {
        format!("+{diff:.1}%")
    } else {
        format!("{diff:.1}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(date: &str, target: &str, spend: f64, revenue: f64, clicks: u64) -> MetricRecord {
        MetricRecord {
            date: day(date),
            spend,
            clicks,
            impressions: clicks * 100,
            leads: clicks / 10,
            messaging: clicks / 5,
            conversions: clicks / 20,
            revenue,
            target_id: target.to_string(),
        }
    }

    fn march() -> DateRange {
        DateRange::new(day("2024-03-01"), day("2024-03-31"))
    }

    fn sample() -> Vec<MetricRecord> {
        vec![
            rec("2024-03-02", "cmp_1", 10.5, 30.0, 40),
            rec("2024-03-01", "cmp_1", 20.0, 10.0, 20),
            rec("2024-03-02", "cmp_2", 5.25, 0.0, 60),
            rec("2024-02-29", "cmp_1", 99.0, 99.0, 99),
            rec("2024-04-01", "cmp_2", 1.0, 1.0, 1),
        ]
    }

    #[test]
    fn test_combine_groups_by_date_within_range() {
        let combined = combine_by_date(&sample(), &march());
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].date, day("2024-03-01"));
        assert_eq!(combined[0].target_id, "cmp_1");
        assert_eq!(combined[1].date, day("2024-03-02"));
        assert_eq!(combined[1].spend, 15.75);
        assert_eq!(combined[1].clicks, 100);
        assert_eq!(combined[1].impressions, 10_000);
        assert_eq!(combined[1].messaging, 8 + 12);
        assert_eq!(combined[1].revenue, 30.0);
        assert_eq!(combined[1].target_id, ALL_TARGETS);
    }

    #[test]
    fn test_combine_ignores_input_order() {
        let forward = combine_by_date(&sample(), &march());
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(combine_by_date(&reversed, &march()), forward);
    }

    #[test]
    fn test_combine_is_idempotent() {
        let once = combine_by_date(&sample(), &march());
        let twice = combine_by_date(&once, &march());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_combine_empty_input() {
        assert!(combine_by_date(&[], &march()).is_empty());
    }

    #[test]
    fn test_totals_roas_from_sums_not_daily_average() {
        let records = vec![
            rec("2024-03-01", "cmp_1", 100.0, 50.0, 10),
            rec("2024-03-02", "cmp_1", 50.0, 200.0, 10),
        ];
        let t = totals(&records, &march());
        assert_eq!(t.spend, 150.0);
        assert_eq!(t.revenue, 250.0);
        assert!((t.roas - 250.0 / 150.0).abs() < 1e-12);
        // average of daily ROAS (0.5 and 4.0) would be 2.25
        assert!((t.roas - 2.25).abs() > 0.1);
    }

    #[test]
    fn test_totals_ratios() {
        let records = vec![rec("2024-03-05", "act_1", 200.0, 600.0, 100)];
        let t = totals(&records, &march());
        assert_eq!(t.ctr, 1.0);
        assert_eq!(t.cpc, 2.0);
        assert_eq!(t.cpl, 20.0);
        assert_eq!(t.cpa, 40.0);
        assert_eq!(t.roas, 3.0);
    }

    #[test]
    fn test_totals_zero_denominators_yield_zero() {
        let t = totals(&[rec("2024-03-05", "act_1", 0.0, 10.0, 0)], &march());
        assert_eq!(t.ctr, 0.0);
        assert_eq!(t.cpc, 0.0);
        assert_eq!(t.cpa, 0.0);
        assert_eq!(t.cpl, 0.0);
        assert_eq!(t.roas, 0.0);
        assert_eq!(totals(&[], &march()), CalculatedMetrics::default());
    }

    #[test]
    fn test_totals_respects_range() {
        let t = totals(&sample(), &march());
        assert_eq!(t.spend, 35.75);
        assert_eq!(t.clicks, 120);
    }

    #[test]
    fn test_trend_formatting() {
        assert_eq!(trend(0.0, 0.0), "0%");
        assert_eq!(trend(10.0, 0.0), "+100%");
        assert_eq!(trend(5.0, 10.0), "-50.0%");
        assert_eq!(trend(15.0, 10.0), "+50.0%");
        assert_eq!(trend(10.0, 10.0), "+0.0%");
        assert_eq!(trend(1.0, 3.0), "-66.7%");
    }
}
