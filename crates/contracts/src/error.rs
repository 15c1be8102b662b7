//! Layered error definitions
//!
//! Categorized by source: config / parse / validation / storage / dispatch

use thiserror::Error;

use crate::FailureClass;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Ingestion Errors =====
    /// Input could not be decoded, is of an unsupported kind, or is too large
    #[error("parse error: {message}")]
    Parse { message: String },

    // ===== Request Errors =====
    /// Malformed filter or dispatch request
    #[error("validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// Referenced temp artifact is missing
    #[error("dataset not found: {id}")]
    NotFound { id: String },

    // ===== Output Errors =====
    /// Artifact or report could not be written
    #[error("failed to persist '{path}': {message}")]
    Persistence { path: String, message: String },

    /// Dispatch run ended with failures
    #[error("dispatch failed: {}", class.user_message())]
    Dispatch { class: FailureClass },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create request validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create not-found error
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create persistence error
    pub fn persistence(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}
