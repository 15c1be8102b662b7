//! MessageTransport trait - DispatchCoordinator output interface

use serde::{Deserialize, Serialize};

/// Outbound request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub phone: String,
    pub message: String,
}

/// Result of one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAttempt {
    /// 2xx response
    Accepted { status: u16 },
    /// Non-2xx response
    Rejected { status: u16 },
    /// No response at all (connect failure, timeout, missing token)
    NoResponse { reason: String },
}

impl SendAttempt {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// HTTP status, if a response arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Accepted { status } | Self::Rejected { status } => Some(*status),
            Self::NoResponse { .. } => None,
        }
    }

    /// Build from an HTTP status code
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            Self::Accepted { status }
        } else {
            Self::Rejected { status }
        }
    }
}

/// Outbound message transport
///
/// Transport failures are reported as [`SendAttempt`] values, never as errors:
/// one recipient failing must not abort a run.
#[trait_variant::make(MessageTransport: Send)]
pub trait LocalMessageTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one message and wait for the response
    async fn send(&mut self, message: &OutboundMessage) -> SendAttempt;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(SendAttempt::from_status(200).is_accepted());
        assert!(SendAttempt::from_status(204).is_accepted());
        assert_eq!(
            SendAttempt::from_status(429),
            SendAttempt::Rejected { status: 429 }
        );
        assert_eq!(
            SendAttempt::NoResponse {
                reason: "timeout".into()
            }
            .status(),
            None
        );
    }
}
