//! Performance reporting: reporting windows, daily aggregation, KPI
//! dashboards and the exportable breakdown table.

pub mod aggregation;
pub mod dashboard;
pub mod range;
pub mod table;

pub use aggregation::{combine_by_date, totals, trend};
pub use dashboard::{DashboardSnapshot, Kpi, KpiCard};
pub use range::calculate_ranges;
pub use table::{export_csv, SortConfig, SortDirection, SortKey, TableView};
