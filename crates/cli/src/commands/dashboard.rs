//! Dashboard, history and anomaly commands

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use console_lib::aggregation::{
    anomaly_banner, chart_points, recent_window, severity_distribution, AnomalyBanner, ChartPoint,
    SeverityDistribution,
};
use console_lib::{
    AnomalyStatus, ConsoleMetrics, Gateway, PollingController, RefreshOutcome, ViewState,
};
use serde::Serialize;
use std::sync::Arc;

use super::operator_error;
use crate::output::{
    print_banner, print_error, print_error_rate_chart, print_history, print_info, print_json,
    print_severity_distribution, OutputFormat,
};

/// Everything derived from one view snapshot
#[derive(Serialize)]
pub struct DashboardReport<'a> {
    #[serde(flatten)]
    pub view: &'a ViewState,
    pub severity: SeverityDistribution,
    pub banner: Option<AnomalyBanner>,
    pub error_rate: Vec<ChartPoint>,
}

impl<'a> DashboardReport<'a> {
    pub fn from_view(view: &'a ViewState) -> Self {
        Self {
            view,
            severity: severity_distribution(&view.history),
            banner: view.anomaly.as_ref().map(anomaly_banner),
            error_rate: view
                .anomaly
                .as_ref()
                .map(|status| chart_points(recent_window(&status.time_series), &Local))
                .unwrap_or_default(),
        }
    }
}

/// Render a full dashboard snapshot
pub fn render_view(view: &ViewState, format: OutputFormat) -> Result<()> {
    let report = DashboardReport::from_view(view);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", "📊 Bug Intelligence Dashboard".bold());
            println!("{}", "=".repeat(50));

            if let Some(error) = &view.error {
                print_error(error);
            }
            if let Some(banner) = &report.banner {
                print_banner(banner);
            }
            println!();

            print_severity_distribution(&report.severity);
            println!();

            if view.anomaly.is_some() {
                print_error_rate_chart(&report.error_rate);
                println!();
            }

            if view.loading {
                print_info("Loading history…");
            } else {
                print_history(&view.history);
            }
        }
    }

    Ok(())
}

/// One-shot dashboard: a single refresh cycle, rendered once
pub async fn show_dashboard(controller: &Arc<PollingController>, format: OutputFormat) -> Result<()> {
    let outcome = controller.refresh().await;
    let view = controller.snapshot();
    controller.teardown();

    render_view(&view, format)?;

    if let RefreshOutcome::Failed(err) = outcome {
        return Err(operator_error(err));
    }
    Ok(())
}

/// Show prediction history
pub async fn show_history(gateway: &dyn Gateway, format: OutputFormat) -> Result<()> {
    let history = gateway.fetch_history().await.map_err(operator_error)?;

    match format {
        OutputFormat::Json => print_json(&history)?,
        OutputFormat::Table => {
            print_severity_distribution(&severity_distribution(&history));
            println!();
            print_history(&history);
            println!("\nTotal: {} predictions", history.len());
        }
    }

    Ok(())
}

/// Show the current anomaly verdict and error rate
pub async fn show_anomaly(gateway: &dyn Gateway, format: OutputFormat) -> Result<()> {
    let status: AnomalyStatus = gateway.fetch_anomaly_status().await.map_err(operator_error)?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            print_banner(&anomaly_banner(&status));
            println!();
            print_error_rate_chart(&chart_points(recent_window(&status.time_series), &Local));
        }
    }

    Ok(())
}

/// Run one refresh and one background poll, then print the metrics exposition
pub async fn show_metrics(controller: &Arc<PollingController>) -> Result<()> {
    controller.refresh().await;
    controller.poll_anomaly().await;
    controller.teardown();

    print!("{}", ConsoleMetrics::new().render());
    Ok(())
}
