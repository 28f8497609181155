//! Output formatting utilities

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use colored::Colorize;
use console_lib::aggregation::{AnomalyBanner, ChartPoint, SeverityDistribution};
use console_lib::{PredictionRecord, Severity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, confidence * 100.0)
}

/// Render a UTC instant in the viewer's local time
pub fn format_local_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Color a severity label; unknown labels are left plain
pub fn color_severity(label: &str) -> String {
    match Severity::parse(label) {
        Some(Severity::High) => label.red().bold().to_string(),
        Some(Severity::Medium) => label.truecolor(249, 115, 22).bold().to_string(),
        Some(Severity::Low) => label.green().bold().to_string(),
        None => label.to_string(),
    }
}

/// Row for the history table
#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Timestamp (Local)")]
    timestamp: String,
    #[tabled(rename = "Error Message")]
    message: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Users")]
    users: u64,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Impact Score")]
    impact: String,
}

pub fn print_history(history: &[PredictionRecord]) {
    if history.is_empty() {
        print_info("No predictions yet. Run `bugintel predict` to get started!");
        return;
    }

    let rows: Vec<HistoryRow> = history
        .iter()
        .enumerate()
        .map(|(idx, record)| HistoryRow {
            index: idx + 1,
            timestamp: format_local_timestamp(&record.timestamp),
            message: record.error_message.clone(),
            category: record
                .error_category
                .clone()
                .unwrap_or_else(|| "—".to_string()),
            users: record.user_count,
            severity: color_severity(&record.predicted_severity),
            confidence: format_confidence(record.confidence, 1),
            impact: format!("{}", record.impact_score),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Width of a bar scaled against the largest value, at most 30 cells
fn bar_width(value: u64, max: u64) -> usize {
    // widened so huge backend counts cannot overflow the multiply
    (u128::from(value) * 30 / u128::from(max.max(1))).min(30) as usize
}

pub fn print_severity_distribution(dist: &SeverityDistribution) {
    println!("{}", "Severity Distribution".bold());
    println!("{}", "-".repeat(50));

    let widest = dist.entries().iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    for (severity, count) in dist.entries() {
        let bar = "█".repeat(bar_width(count as u64, widest as u64));
        println!(
            "{:<8} {:>4}  {}",
            color_severity(severity.as_str()),
            count,
            bar
        );
    }
}

pub fn print_banner(banner: &AnomalyBanner) {
    match banner {
        AnomalyBanner::Spike {
            current_count,
            expected_high,
            method,
        } => {
            println!(
                "{} {}",
                "🚨 Anomaly detected:".red().bold(),
                format!(
                    "{} errors in the last minute, expected at most {:.2} ({})",
                    current_count, expected_high, method
                )
                .red()
            );
        }
        AnomalyBanner::Normal {
            current_count,
            low,
            high,
            method,
        } => {
            println!(
                "{} {} errors in the last minute, expected {:.2}–{:.2} ({})",
                "✓ Error rate normal:".green().bold(),
                current_count,
                low,
                high,
                method
            );
        }
    }
}

pub fn print_error_rate_chart(points: &[ChartPoint]) {
    println!("{}", "Error Rate – Last 15 Minutes".bold());
    println!("{}", "-".repeat(50));

    if points.is_empty() {
        print_info("No error-rate data yet");
        return;
    }

    let peak = points.iter().map(|p| p.count).max().unwrap_or(0).max(1);
    for point in points {
        let bar = "▇".repeat(bar_width(point.count, peak));
        let plural = if point.count == 1 { "" } else { "s" };
        println!("{:>5}  {}  {} error{}", point.time, bar.blue(), point.count, plural);
    }
}
