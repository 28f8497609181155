//! Backend gateway
//!
//! This module provides:
//! - The `Gateway` trait the polling controller is written against
//! - An HTTP implementation talking JSON to the prediction backend
//! - Local input validation for prediction requests

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{HttpGateway, HttpGatewayConfig};

use crate::error::{GatewayError, Result};
use crate::models::{AnomalyStatus, PredictionRecord, PredictionRequest, PredictionResult};
use async_trait::async_trait;

pub const PREDICT_PATH: &str = "predict";
pub const HISTORY_PATH: &str = "history";
pub const ANOMALY_PATH: &str = "anomaly-status";

/// Remote calls the console depends on
///
/// Implementations only perform the call and parse the answer. They never
/// retry and never touch local view state.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn submit_prediction(&self, error_message: &str, user_count: u32) -> Result<PredictionResult>;

    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>>;

    async fn fetch_anomaly_status(&self) -> Result<AnomalyStatus>;
}

/// Validate a prediction request before anything goes over the wire
pub fn validate_request(error_message: &str, user_count: u32) -> Result<PredictionRequest> {
    if error_message.trim().is_empty() {
        return Err(GatewayError::Validation(
            "Please enter an error message.".to_string(),
        ));
    }
    if user_count < 1 {
        return Err(GatewayError::Validation(
            "Affected users must be at least 1.".to_string(),
        ));
    }

    Ok(PredictionRequest {
        error_message: error_message.to_string(),
        user_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_rejected() {
        for msg in ["", "   ", "\n\t"] {
            let err = validate_request(msg, 1).unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
    }

    #[test]
    fn test_zero_users_rejected() {
        let err = validate_request("Timeout", 0).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_valid_request() {
        let req = validate_request("Database connection refused", 50).unwrap();
        assert_eq!(req.error_message, "Database connection refused");
        assert_eq!(req.user_count, 50);
    }
}
