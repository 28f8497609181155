//! Observability for the console
//!
//! Provides:
//! - Prometheus metrics (refresh cycles, discarded responses, background poll failures, fetch latency)
//! - Structured logging with tracing

use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for backend fetch latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ConsoleMetricsInner> = OnceLock::new();

struct ConsoleMetricsInner {
    fetch_latency_seconds: Histogram,
    refresh_cycles: IntCounter,
    refresh_failures: IntCounter,
    stale_responses: IntCounter,
    anomaly_polls: IntCounter,
    anomaly_poll_failures: IntCounter,
}

impl ConsoleMetricsInner {
    fn new() -> Self {
        Self {
            fetch_latency_seconds: register_histogram!(
                "bugintel_console_fetch_latency_seconds",
                "Time spent waiting for backend fetches",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            refresh_cycles: register_int_counter!(
                "bugintel_console_refresh_cycles_total",
                "Initial-load and manual refresh cycles started"
            )
            .expect("Failed to register refresh_cycles"),

            refresh_failures: register_int_counter!(
                "bugintel_console_refresh_failures_total",
                "Refresh cycles that surfaced an error"
            )
            .expect("Failed to register refresh_failures"),

            stale_responses: register_int_counter!(
                "bugintel_console_stale_responses_total",
                "Responses discarded because a newer one had already been applied"
            )
            .expect("Failed to register stale_responses"),

            anomaly_polls: register_int_counter!(
                "bugintel_console_anomaly_polls_total",
                "Background anomaly polls issued"
            )
            .expect("Failed to register anomaly_polls"),

            anomaly_poll_failures: register_int_counter!(
                "bugintel_console_anomaly_poll_failures_total",
                "Background anomaly polls that failed and were suppressed"
            )
            .expect("Failed to register anomaly_poll_failures"),
        }
    }
}

/// Console metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ConsoleMetrics {
    _private: (),
}

impl Default for ConsoleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ConsoleMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ConsoleMetricsInner {
        GLOBAL_METRICS.get_or_init(ConsoleMetricsInner::new)
    }

    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner().fetch_latency_seconds.observe(duration_secs);
    }

    pub fn inc_refresh_cycles(&self) {
        self.inner().refresh_cycles.inc();
    }

    pub fn inc_refresh_failures(&self) {
        self.inner().refresh_failures.inc();
    }

    pub fn inc_stale_responses(&self) {
        self.inner().stale_responses.inc();
    }

    pub fn inc_anomaly_polls(&self) {
        self.inner().anomaly_polls.inc();
    }

    pub fn inc_anomaly_poll_failures(&self) {
        self.inner().anomaly_poll_failures.inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> String {
        use prometheus::{Encoder, TextEncoder};

        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for console events
#[derive(Clone)]
pub struct StructuredLogger {
    backend: String,
}

impl StructuredLogger {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
        }
    }

    pub fn log_activated(&self, poll_interval_secs: u64) {
        info!(
            event = "console_activated",
            backend = %self.backend,
            poll_interval_secs = poll_interval_secs,
            "Dashboard polling started"
        );
    }

    pub fn log_refresh_started(&self, token: u64) {
        debug!(
            event = "refresh_started",
            backend = %self.backend,
            token = token,
            "Refresh cycle issued"
        );
    }

    pub fn log_refresh_settled(&self, token: u64, records: usize, is_anomaly: bool) {
        info!(
            event = "refresh_settled",
            backend = %self.backend,
            token = token,
            records = records,
            is_anomaly = is_anomaly,
            "Dashboard refreshed"
        );
    }

    pub fn log_refresh_failed(&self, token: u64, error: &str) {
        warn!(
            event = "refresh_failed",
            backend = %self.backend,
            token = token,
            error = %error,
            "Dashboard refresh failed, keeping previous data"
        );
    }

    pub fn log_response_discarded(&self, token: u64, kind: &str) {
        debug!(
            event = "response_discarded",
            backend = %self.backend,
            token = token,
            kind = %kind,
            "Discarded response superseded by a newer one"
        );
    }

    /// Background failures are expected noise, so they stay at debug
    pub fn log_poll_suppressed(&self, token: u64, error: &str) {
        debug!(
            event = "anomaly_poll_suppressed",
            backend = %self.backend,
            token = token,
            error = %error,
            "Background anomaly poll failed"
        );
    }

    pub fn log_anomaly_changed(&self, is_anomaly: bool, current_count: u64) {
        if is_anomaly {
            warn!(
                event = "anomaly_detected",
                backend = %self.backend,
                current_count = current_count,
                "Error rate outside expected range"
            );
        } else {
            debug!(
                event = "anomaly_cleared",
                backend = %self.backend,
                current_count = current_count,
                "Error rate within expected range"
            );
        }
    }

    pub fn log_teardown(&self, reason: &str) {
        info!(
            event = "console_teardown",
            backend = %self.backend,
            reason = %reason,
            "Dashboard polling stopped"
        );
    }
}
