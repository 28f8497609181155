//! Core data models exchanged with the prediction backend

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Timestamp format used by the backend for history rows (naive, UTC)
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Minute bucket label format used by the anomaly time series (naive, UTC)
pub const BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Severity label assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// All recognized labels in display order
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Parse a backend label, returning `None` for anything unrecognized
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "High" => Some(Severity::High),
            "Medium" => Some(Severity::Medium),
            "Low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of prediction history
///
/// The severity is kept as the raw label so that rows with an unexpected
/// value still deserialize; use [`PredictionRecord::severity`] to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub error_message: String,
    #[serde(default)]
    pub error_category: Option<String>,
    pub user_count: u64,
    pub predicted_severity: String,
    pub confidence: f64,
    pub impact_score: f64,
}

impl PredictionRecord {
    pub fn severity(&self) -> Option<Severity> {
        Severity::parse(&self.predicted_severity)
    }
}

/// Request body for `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub error_message: String,
    pub user_count: u32,
}

/// Successful response body for `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub severity: String,
    pub confidence: f64,
    pub impact_score: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
}

/// Expected error-count band reported with the anomaly verdict
///
/// Serialized as a two element array `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ExpectedRange {
    pub low: f64,
    pub high: f64,
}

impl From<(f64, f64)> for ExpectedRange {
    fn from((a, b): (f64, f64)) -> Self {
        // keep low <= high even if the backend swaps them
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

impl From<ExpectedRange> for (f64, f64) {
    fn from(range: ExpectedRange) -> Self {
        (range.low, range.high)
    }
}

/// One minute of error counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesBucket {
    pub bucket: String,
    pub count: u64,
}

impl TimeSeriesBucket {
    /// The bucket start as a UTC instant, if the label is well formed
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&format!("{}:00", self.bucket), RECORD_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

/// Anomaly verdict for the current error rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyStatus {
    pub is_anomaly: bool,
    pub current_count: u64,
    pub expected_range: ExpectedRange,
    pub method: String,
    #[serde(default)]
    pub time_series: Vec<TimeSeriesBucket>,
}

/// Serde adapter for backend timestamps
///
/// The backend emits naive `YYYY-MM-DD HH:MM:SS` strings that represent UTC.
/// They are pinned to UTC here so nothing downstream can mistake them for
/// local time. RFC 3339 strings are accepted as well.
pub mod utc_timestamp {
    use super::*;

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, RECORD_TIMESTAMP_FORMAT) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(RECORD_TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
