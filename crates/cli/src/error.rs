//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `send` invoked without operator credentials
    #[error("Operator credentials required: pass --operator and set ROWCAST_PASSWORD")]
    OperatorRequired,

    /// Operator credentials rejected
    #[error("Invalid credentials for operator '{username}'")]
    InvalidCredentials { username: String },

    /// `send` invoked without a gateway section
    #[error("No [gateway] configured; use --dry-run or add a gateway section")]
    GatewayNotConfigured,

    /// Dispatch run finished with failures
    #[error("{message}")]
    DispatchFailed { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_credentials(username: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            username: username.into(),
        }
    }

    pub fn dispatch_failed(message: impl Into<String>) -> Self {
        Self::DispatchFailed {
            message: message.into(),
        }
    }
}
