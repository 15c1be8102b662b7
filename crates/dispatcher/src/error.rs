//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// HTTP client construction or request failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Secret referenced by configuration is missing
    #[error("environment variable '{name}' is not set")]
    MissingEnv { name: String },

    /// Token endpoint answered with a non-2xx status
    #[error("token endpoint returned status {status}")]
    TokenStatus { status: u16 },

    /// Token endpoint answered without a usable token
    #[error("token response has neither 'access_token' nor 'token'")]
    TokenMissing,
}

impl DispatcherError {
    pub fn missing_env(name: impl Into<String>) -> Self {
        Self::MissingEnv { name: name.into() }
    }
}

impl From<DispatcherError> for ContractError {
    fn from(err: DispatcherError) -> Self {
        match err {
            DispatcherError::MissingEnv { name } => {
                ContractError::config_validation(name, "environment variable is not set")
            }
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Read a required environment variable
pub(crate) fn require_env(name: &str) -> Result<String, DispatcherError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DispatcherError::missing_env(name))
}
