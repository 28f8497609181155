//! CLI command implementations

pub mod dashboard;
pub mod predict;
pub mod watch;

use console_lib::GatewayError;
use tracing::debug;

/// Turn a gateway error into what the operator should read
fn operator_error(err: GatewayError) -> anyhow::Error {
    debug!(error = %err, "Backend call failed");
    anyhow::anyhow!(err.user_message().to_string())
}
