#![warn(clippy::unwrap_used)]

pub mod client;
pub mod local;
pub mod store;

pub use client::RedisMetricsCache;
pub use local::LocalMetricsCache;
pub use store::MetricsCache;
