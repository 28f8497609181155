//! Error taxonomy for backend calls

use thiserror::Error;

/// Message shown when the backend cannot be reached or answers garbage
pub const BACKEND_UNREACHABLE: &str = "Server not reachable. Is the backend running?";

/// Message shown when an initial load or manual refresh fails
pub const REFRESH_FAILED: &str = "Could not load history. Is the backend running?";

/// Errors produced by the gateway client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Input rejected locally, nothing was sent
    #[error("{0}")]
    Validation(String),

    /// The backend answered with an explicit `error` field
    #[error("{0}")]
    Service(String),

    /// The call could not complete or the body could not be parsed
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Text suitable for showing to the operator
    ///
    /// Validation and service messages are shown verbatim; transport details
    /// are replaced with a fixed message.
    pub fn user_message(&self) -> &str {
        match self {
            GatewayError::Validation(msg) | GatewayError::Service(msg) => msg,
            GatewayError::Transport(_) => BACKEND_UNREACHABLE,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
