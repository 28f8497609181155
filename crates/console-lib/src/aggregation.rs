//! Aggregations over history and anomaly payloads
//!
//! Everything here is a pure function of its input: the same slice always
//! produces the same output, independent of call order.

use crate::models::{AnomalyStatus, PredictionRecord, Severity, TimeSeriesBucket};
use chrono::TimeZone;
use serde::Serialize;

/// Number of minute buckets shown in the error-rate chart
pub const RECENT_WINDOW: usize = 15;

/// Per-label counts over a history snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityDistribution {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Number of rows with a recognized label
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// `(label, count)` pairs in display order
    pub fn entries(&self) -> [(Severity, usize); 3] {
        Severity::ALL.map(|s| (s, self.get(s)))
    }
}

/// Count High/Medium/Low predictions
///
/// Rows with an unrecognized label are skipped rather than rejected so a
/// single malformed row cannot take down the dashboard.
pub fn severity_distribution(records: &[PredictionRecord]) -> SeverityDistribution {
    records
        .iter()
        .filter_map(PredictionRecord::severity)
        .fold(SeverityDistribution::default(), |mut acc, severity| {
            match severity {
                Severity::High => acc.high += 1,
                Severity::Medium => acc.medium += 1,
                Severity::Low => acc.low += 1,
            }
            acc
        })
}

/// The last [`RECENT_WINDOW`] buckets, oldest first
///
/// Shorter series are returned whole; gaps are not filled.
pub fn recent_window(series: &[TimeSeriesBucket]) -> &[TimeSeriesBucket] {
    recent_window_of(series, RECENT_WINDOW)
}

/// Same as [`recent_window`] with an explicit size
pub fn recent_window_of(series: &[TimeSeriesBucket], size: usize) -> &[TimeSeriesBucket] {
    &series[series.len().saturating_sub(size)..]
}

/// A chart point labelled in the viewer's time zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub time: String,
    pub count: u64,
}

/// Convert UTC minute buckets into `HH:MM` points in `tz`
///
/// Labels that do not parse are passed through unchanged.
pub fn chart_points<Tz>(window: &[TimeSeriesBucket], tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    window
        .iter()
        .map(|bucket| ChartPoint {
            time: bucket
                .starts_at()
                .map(|utc| utc.with_timezone(tz).format("%H:%M").to_string())
                .unwrap_or_else(|| bucket.bucket.clone()),
            count: bucket.count,
        })
        .collect()
}

/// What the anomaly banner should say
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnomalyBanner {
    /// Error rate inside the expected band
    Normal {
        current_count: u64,
        low: f64,
        high: f64,
        method: String,
    },
    /// Error rate flagged as anomalous
    Spike {
        current_count: u64,
        expected_high: f64,
        method: String,
    },
}

impl AnomalyBanner {
    pub fn is_spike(&self) -> bool {
        matches!(self, AnomalyBanner::Spike { .. })
    }
}

pub fn anomaly_banner(status: &AnomalyStatus) -> AnomalyBanner {
    if status.is_anomaly {
        AnomalyBanner::Spike {
            current_count: status.current_count,
            expected_high: status.expected_range.high,
            method: status.method.clone(),
        }
    } else {
        AnomalyBanner::Normal {
            current_count: status.current_count,
            low: status.expected_range.low,
            high: status.expected_range.high,
            method: status.method.clone(),
        }
    }
}
