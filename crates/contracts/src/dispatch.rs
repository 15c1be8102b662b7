//! Dispatch run types - DispatchCoordinator output
//!
//! A run produces one [`DispatchResult`] per non-blank phone, an aggregated
//! [`DispatchSummary`] and a single classified [`DispatchOutcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Per-recipient delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Failed,
    Pending,
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// One report line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// Identifier column text, or the 1-based row number
    pub identifier: String,

    /// Name column text, empty when unbound
    pub display_name: String,

    /// Trimmed phone number
    pub phone: String,

    pub status: DispatchStatus,

    /// Last status change (UTC)
    pub timestamp: DateTime<Utc>,

    /// Send round trip in milliseconds, absent until attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl DispatchResult {
    /// New entry in `Pending` state
    pub fn pending(identifier: String, display_name: String, phone: String) -> Self {
        Self {
            identifier,
            display_name,
            phone,
            status: DispatchStatus::Pending,
            timestamp: Utc::now(),
            latency_ms: None,
        }
    }

    /// Move to a final status
    pub fn finalize(&mut self, status: DispatchStatus) {
        self.status = status;
        self.timestamp = Utc::now();
    }
}

/// Failure classes, one fixed user-facing message each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// At least one send got no response at all
    NetworkUnreachable,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    ServiceUnavailable,
    /// HTTP 429
    RateLimited,
    /// HTTP 500
    UpstreamServerError,
    /// Any other non-2xx status
    UpstreamFailure,
}

impl FailureClass {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::ServiceUnavailable,
            429 => Self::RateLimited,
            500 => Self::UpstreamServerError,
            _ => Self::UpstreamFailure,
        }
    }

    /// Fixed message shown to the caller
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable => {
                "Could not reach the messaging service. Check the network connection and try again."
            }
            Self::Unauthorized => "The messaging service rejected the credentials. Sign in again.",
            Self::Forbidden => "This account is not allowed to send messages.",
            Self::ServiceUnavailable => "The messaging service is unavailable right now.",
            Self::RateLimited => "Too many messages were sent. Wait a moment and try again.",
            Self::UpstreamServerError => "The messaging service reported an internal error.",
            Self::UpstreamFailure => "Some messages could not be sent.",
        }
    }

    /// Whether further sends in the same run are pointless
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }

    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable => "network_unreachable",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::ServiceUnavailable => "service_unavailable",
            Self::RateLimited => "rate_limited",
            Self::UpstreamServerError => "upstream_server_error",
            Self::UpstreamFailure => "upstream_failure",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified result of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "class", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Success,
    Failed(FailureClass),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Fixed message shown to the caller
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Success => "All messages were sent successfully.",
            Self::Failed(class) => class.user_message(),
        }
    }

    /// Surface a failed outcome as an error
    pub fn into_result(self) -> Result<(), ContractError> {
        match self {
            Self::Success => Ok(()),
            Self::Failed(class) => Err(ContractError::Dispatch { class }),
        }
    }
}

/// Aggregated counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub success_count: usize,
    pub fail_count: usize,

    /// Rows skipped for a blank phone
    pub skipped_count: usize,

    /// Last non-success HTTP status observed
    pub last_failure_status: Option<u16>,

    /// Whether any send got no response
    pub network_failure: bool,
}

impl DispatchSummary {
    /// Classify the run
    ///
    /// No-response failures dominate; otherwise the last failure status decides.
    pub fn classify(&self) -> DispatchOutcome {
        if self.fail_count == 0 {
            return DispatchOutcome::Success;
        }
        if self.network_failure {
            return DispatchOutcome::Failed(FailureClass::NetworkUnreachable);
        }
        let class = self
            .last_failure_status
            .map(FailureClass::from_status)
            .unwrap_or(FailureClass::UpstreamFailure);
        DispatchOutcome::Failed(class)
    }

    /// Number of sends attempted
    pub fn attempted(&self) -> usize {
        self.success_count + self.fail_count
    }
}

/// Report of the most recent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Results in row order
    pub results: Vec<DispatchResult>,
    pub summary: DispatchSummary,
    pub outcome: DispatchOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DispatchReport {
    pub fn count(&self, status: DispatchStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Coordinator run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Completed,
}
