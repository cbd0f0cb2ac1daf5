//! Data sources: the live advertising-platform connector, insight row
//! normalisation, and the synthetic demo catalogue.

pub mod actions;
pub mod connector;
pub mod graph_api;
pub mod mock;

pub use connector::{InsightLevel, LiveSource};
pub use graph_api::GraphApiClient;
pub use mock::{mock_accounts, mock_campaigns, MockGenerator};
