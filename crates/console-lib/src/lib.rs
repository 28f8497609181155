//! Client library for the Bug Intelligence console
//!
//! This crate provides the core functionality for:
//! - Calling the prediction backend (predict, history, anomaly status)
//! - Aggregating history and anomaly payloads for display
//! - Polling the backend with stale-response rejection and teardown
//! - Holding the view state consumed by presentation
//! - Metrics and structured logging

pub mod aggregation;
pub mod error;
pub mod gateway;
pub mod models;
pub mod observability;
pub mod polling;
pub mod view;

pub use error::GatewayError;
pub use gateway::{Gateway, HttpGateway, HttpGatewayConfig};
pub use models::*;
pub use observability::{ConsoleMetrics, StructuredLogger};
pub use polling::{PollOutcome, PollingConfig, PollingController, RefreshOutcome};
pub use view::{PredictionPanel, RefreshPhase, ViewState};
