pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{ApiError, FetchError, InsightError, InsightResult};
pub use session::{SessionState, SessionStore};
pub use types::{
    AdAccount, CalculatedMetrics, Campaign, DateRange, MetricRecord, RangePair, TargetScope,
    TimeRange, User,
};
