//! Configuration management for the CLI

use anyhow::{Context, Result};
use console_lib::{HttpGatewayConfig, PollingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Prediction backend base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Background anomaly poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from defaults, a JSON file and the environment
    ///
    /// An explicit `path` must exist. Without one, `~/.config/bugintel/config.json`
    /// is used if present. `BUGINTEL_*` variables override the file.
    /// Values are not validated here; call [`ConsoleConfig::validate`] once
    /// command-line overrides have been applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api_url", default_api_url())?
            .set_default("poll_interval_secs", default_poll_interval() as i64)?
            .set_default("request_timeout_secs", default_request_timeout() as i64)?;

        match path {
            Some(path) => {
                builder = builder.add_source(
                    config::File::from(path.to_path_buf())
                        .format(config::FileFormat::Json)
                        .required(true),
                );
            }
            None => {
                if let Some(default_path) = Self::config_path().filter(|p| p.exists()) {
                    builder = builder.add_source(
                        config::File::from(default_path).format(config::FileFormat::Json),
                    );
                }
            }
        }

        builder
            .add_source(config::Environment::with_prefix("BUGINTEL").try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Reject values the polling loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            anomaly_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("bugintel").join("config.json"))
    }
}
