//! Predict form state

use crate::error::GatewayError;
use crate::gateway::{validate_request, Gateway};
use crate::models::PredictionResult;
use serde::Serialize;
use tracing::debug;

/// State behind the "Predict Severity" form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionPanel {
    pub loading: bool,
    pub result: Option<PredictionResult>,
    pub error: Option<String>,
}

impl PredictionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit the form
    ///
    /// Blank input is rejected inline without calling the gateway. Otherwise
    /// the previous result and error are cleared before the call and exactly
    /// one of them is set afterwards.
    pub async fn submit(
        &mut self,
        gateway: &dyn Gateway,
        error_message: &str,
        user_count: u32,
    ) -> Result<&PredictionResult, GatewayError> {
        if let Err(err) = validate_request(error_message, user_count) {
            self.error = Some(err.user_message().to_string());
            return Err(err);
        }

        self.loading = true;
        self.error = None;
        self.result = None;

        let outcome = gateway.submit_prediction(error_message, user_count).await;
        self.loading = false;

        match outcome {
            Ok(result) => {
                debug!(severity = %result.severity, "Prediction stored in panel");
                Ok(&*self.result.insert(result))
            }
            Err(err) => {
                self.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }
}
