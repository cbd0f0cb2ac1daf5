//! Reporting windows: derives the current period and the comparison period
//! from the selected time-range mode.

use chrono::{Datelike, Duration, NaiveDate};
use insight_core::types::{DateRange, RangePair, TimeRange};
use tracing::warn;

pub const LABEL_TODAY: &str = "vs. yesterday";
pub const LABEL_LAST_7: &str = "vs. previous 7 days";
pub const LABEL_LAST_30: &str = "vs. previous 30 days";
pub const LABEL_PREVIOUS_MONTH: &str = "vs. month before";
pub const LABEL_YEAR: &str = "vs. previous year";
pub const LABEL_CUSTOM: &str = "vs. previous period";

/// Compute the current and comparison ranges for `mode` as seen on `today`.
/// `custom_range` is only consulted in [`TimeRange::Custom`] mode.
pub fn calculate_ranges(mode: TimeRange, custom_range: DateRange, today: NaiveDate) -> RangePair {
    let (days, label) = match mode {
        TimeRange::Today => (1, LABEL_TODAY),
        TimeRange::Last7 => (7, LABEL_LAST_7),
        TimeRange::Last30 => (30, LABEL_LAST_30),
        TimeRange::Year => (365, LABEL_YEAR),
        TimeRange::PreviousMonth => return previous_month(today),
        TimeRange::Custom => return custom(custom_range),
    };

    let current = DateRange::new(today - Duration::days(days - 1), today);
    RangePair {
        current,
        previous: current.preceding(days),
        comparison_label: label.to_string(),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn previous_month(today: NaiveDate) -> RangePair {
    let current_end = first_of_month(today) - Duration::days(1);
    let current_start = first_of_month(current_end);
    let previous_end = current_start - Duration::days(1);
    let previous_start = first_of_month(previous_end);

    RangePair {
        current: DateRange::new(current_start, current_end),
        previous: DateRange::new(previous_start, previous_end),
        comparison_label: LABEL_PREVIOUS_MONTH.to_string(),
    }
}

fn custom(range: DateRange) -> RangePair {
    let days = range.num_days();
    if days < 1 {
        warn!(
            start = %range.start_date,
            end = %range.end_date,
            "Custom range ends before it starts, clamping comparison to one day"
        );
    }

    RangePair {
        current: range,
        previous: range.preceding(days),
        comparison_label: LABEL_CUSTOM.to_string(),
    }
}
