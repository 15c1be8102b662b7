//! LogTransport - logs messages instead of sending them

use contracts::{MessageTransport, OutboundMessage, SendAttempt};
use tracing::{info, instrument};

/// Dry-run transport; every message is accepted
pub struct LogTransport {
    name: String,
    logged: u64,
}

impl LogTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logged: 0,
        }
    }

    /// Messages logged so far
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl MessageTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, message),
        fields(transport = %self.name, phone = %message.phone)
    )]
    async fn send(&mut self, message: &OutboundMessage) -> SendAttempt {
        self.logged += 1;
        info!(
            transport = %self.name,
            phone = %message.phone,
            chars = message.message.chars().count(),
            "Message logged (dry run)"
        );
        SendAttempt::Accepted { status: 200 }
    }
}
