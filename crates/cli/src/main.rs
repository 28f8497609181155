//! Bug Intelligence console
//!
//! A terminal front-end for the prediction backend: submit error
//! messages for triage, browse history, and watch the error-rate
//! anomaly detector.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{dashboard, predict, watch};
use console_lib::{Gateway, HttpGateway, PollingController, StructuredLogger};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Bug Intelligence console
#[derive(Parser)]
#[command(name = "bugintel")]
#[command(author, version, about = "Terminal console for Bug Intelligence", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file and BUGINTEL_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Background anomaly poll interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict severity and root cause for an error message
    Predict {
        /// The error message to triage
        message: String,

        /// Number of affected users
        #[arg(long, short, default_value_t = 1)]
        users: u32,
    },

    /// Show prediction history
    History,

    /// Show current anomaly status and error rate
    Anomaly,

    /// Load the dashboard once and print it
    Dashboard,

    /// Live dashboard with background anomaly polling
    Watch,

    /// Run one refresh and poll, then print console metrics
    Metrics,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load configuration, flags win over file and environment
    let mut config = config::ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }
    config.validate()?;
    debug!(api_url = %config.api_url, poll_interval = config.poll_interval_secs, "Console configured");

    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(config.gateway_config())?);
    let controller = || {
        PollingController::new(
            gateway.clone(),
            config.polling_config(),
            StructuredLogger::new(&config.api_url),
        )
    };

    match cli.command {
        Commands::Predict { message, users } => {
            predict::predict(gateway.as_ref(), &message, users, cli.format).await?;
        }
        Commands::History => {
            dashboard::show_history(gateway.as_ref(), cli.format).await?;
        }
        Commands::Anomaly => {
            dashboard::show_anomaly(gateway.as_ref(), cli.format).await?;
        }
        Commands::Dashboard => {
            dashboard::show_dashboard(&controller(), cli.format).await?;
        }
        Commands::Watch => {
            watch::watch(&controller(), cli.format).await?;
        }
        Commands::Metrics => {
            dashboard::show_metrics(&controller()).await?;
        }
    }

    Ok(())
}
