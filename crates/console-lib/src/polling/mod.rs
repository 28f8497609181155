//! Dashboard polling
//!
//! This module provides:
//! - Initial load and manual refresh of history and anomaly status
//! - A fixed-interval background anomaly poll with silent failure handling
//! - Teardown that cancels the ticker and discards late responses

mod controller;


pub use controller::{
    PollOutcome, PollingConfig, PollingController, RefreshOutcome, DEFAULT_ANOMALY_INTERVAL,
};
