//! HTTP client for the prediction backend

use super::{validate_request, Gateway, ANOMALY_PATH, HISTORY_PATH, PREDICT_PATH};
use crate::error::{GatewayError, Result};
use crate::models::{AnomalyStatus, PredictionRecord, PredictionResult};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Backend base URL (e.g., "http://127.0.0.1:5000")
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Gateway talking JSON over HTTP
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a new gateway
    pub fn new(config: HttpGatewayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API URL: {}", config.base_url))?;
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Create a gateway with the default timeout
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        Self::new(HttpGatewayConfig {
            base_url: base_url.to_string(),
            ..HttpGatewayConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::Transport(format!("invalid path {path}: {e}")))
    }

    /// GET a JSON document, mapping every failure to a transport error
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(path = %path, error = %e, "Request failed");
            GatewayError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(path = %path, status = %status, "Backend returned error status");
            return Err(GatewayError::Transport(format!("HTTP {status} from /{path}")));
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!(path = %path, error = %e, "Failed to parse response");
            GatewayError::from(e)
        })?;

        debug!(
            path = %path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn submit_prediction(&self, error_message: &str, user_count: u32) -> Result<PredictionResult> {
        let request = validate_request(error_message, user_count)?;
        let url = self.url(PREDICT_PATH)?;
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Prediction request failed");
                GatewayError::from(e)
            })?;

        let status = response.status();
        // The backend reports refusals as {"error": ...}, sometimes with a 4xx
        let body: serde_json::Value = response.json().await.map_err(|e| {
            warn!(status = %status, error = %e, "Prediction response is not JSON");
            GatewayError::from(e)
        })?;

        if let Some(message) = body.get("error") {
            let message = match message.as_str() {
                Some(text) => text.to_string(),
                None => message.to_string(),
            };
            debug!(status = %status, error = %message, "Backend rejected prediction");
            return Err(GatewayError::Service(message));
        }

        if !status.is_success() {
            return Err(GatewayError::Transport(format!("HTTP {status} from /{PREDICT_PATH}")));
        }

        let result: PredictionResult = serde_json::from_value(body)
            .map_err(|e| GatewayError::Transport(format!("malformed prediction: {e}")))?;

        debug!(
            severity = %result.severity,
            confidence = result.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prediction received"
        );
        Ok(result)
    }

    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>> {
        self.get(HISTORY_PATH).await
    }

    async fn fetch_anomaly_status(&self) -> Result<AnomalyStatus> {
        self.get(ANOMALY_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const HISTORY_BODY: &str = r#"[
        {"id": 2, "timestamp": "2024-03-01 10:05:00", "error_message": "Payment gateway timeout",
         "error_category": "Payment Failure", "user_count": 120, "predicted_severity": "High",
         "confidence": 0.88, "impact_score": 91.2},
        {"id": 1, "timestamp": "2024-03-01 10:01:30", "error_message": "NullPointerException",
         "error_category": null, "user_count": 3, "predicted_severity": "Low",
         "confidence": 0.61, "impact_score": 4.0}
    ]"#;

    const ANOMALY_BODY: &str = r#"{
        "is_anomaly": true, "current_count": 9, "expected_range": [0.0, 3.5],
        "method": "IsolationForest",
        "time_series": [{"bucket": "2024-03-01 10:04", "count": 1}, {"bucket": "2024-03-01 10:05", "count": 9}]
    }"#;

    #[tokio::test]
    async fn test_fetch_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(HISTORY_BODY)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let history = gateway.fetch_history().await.unwrap();

        mock.assert_async().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, 2);
        assert_eq!(history[0].error_category.as_deref(), Some("Payment Failure"));
        assert_eq!(history[1].error_category, None);
    }

    #[tokio::test]
    async fn test_fetch_anomaly_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/anomaly-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ANOMALY_BODY)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let status = gateway.fetch_anomaly_status().await.unwrap();

        assert!(status.is_anomaly);
        assert_eq!(status.current_count, 9);
        assert_eq!(status.method, "IsolationForest");
        assert_eq!(status.time_series[1].count, 9);
    }

    #[tokio::test]
    async fn test_history_server_error_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/history")
            .with_status(500)
            .with_body("<html>Internal Server Error</html>")
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let err = gateway.fetch_history().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_malformed_anomaly_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/anomaly-status")
            .with_status(200)
            .with_body(r#"{"is_anomaly": "maybe"}"#)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let err = gateway.fetch_anomaly_status().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_submit_prediction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(Matcher::Json(serde_json::json!({
                "error_message": "Database connection refused",
                "user_count": 50
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"severity": "High", "confidence": 0.93, "impact_score": 78,
                    "category": "Database Error", "root_cause": "DB unreachable",
                    "suggested_fix": "1. Check the connection pool"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let result = gateway
            .submit_prediction("Database connection refused", 50)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.severity, "High");
        assert_eq!(result.confidence, 0.93);
        assert_eq!(result.impact_score, 78.0);
        assert_eq!(result.category.as_deref(), Some("Database Error"));
    }

    #[tokio::test]
    async fn test_submit_blank_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .expect(0)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let err = gateway.submit_prediction("", 5).await.unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_service_error_is_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "error_message is required"}"#)
            .create_async()
            .await;

        let gateway = HttpGateway::with_base_url(&server.url()).unwrap();
        let err = gateway.submit_prediction("boom", 1).await.unwrap_err();

        assert_eq!(err, GatewayError::Service("error_message is required".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport() {
        // Port 9 (discard) is closed on test machines
        let gateway = HttpGateway::new(HttpGatewayConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = gateway.fetch_history().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.user_message(), crate::error::BACKEND_UNREACHABLE);
    }

    #[test]
    fn test_base_url_with_prefix() {
        let gateway = HttpGateway::with_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(gateway.url("history").unwrap().as_str(), "http://localhost:5000/api/history");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpGateway::with_base_url("not a url").is_err());
    }
}
