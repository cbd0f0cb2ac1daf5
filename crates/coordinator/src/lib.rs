//! Fetch orchestration: the live → cache → error fallback cycle and the
//! session controller driving it.

pub mod controller;
pub mod fallback;

#[cfg(test)]
mod testing;

pub use controller::{DataMode, FetchTicket, SessionController};
pub use fallback::{FallbackCoordinator, FetchOutcome, FetchState};
