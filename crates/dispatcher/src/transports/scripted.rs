//! ScriptedTransport - replays a fixed sequence of attempts

use std::collections::VecDeque;
use std::time::Duration;

use contracts::{MessageTransport, OutboundMessage, SendAttempt};
use tracing::debug;

/// Transport for tests and rehearsals
///
/// Answers with the scripted attempts in order, then accepts everything.
/// Every message it receives is kept for inspection.
#[derive(Debug)]
pub struct ScriptedTransport {
    name: String,
    script: VecDeque<SendAttempt>,
    delay: Option<Duration>,
    received: Vec<OutboundMessage>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = SendAttempt>) -> Self {
        Self {
            name: "scripted".to_string(),
            script: script.into_iter().collect(),
            delay: None,
            received: Vec::new(),
        }
    }

    /// Transport that accepts every message
    pub fn accepting() -> Self {
        Self::new([])
    }

    /// Wait `delay` before answering each send
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn received(&self) -> &[OutboundMessage] {
        &self.received
    }
}

impl MessageTransport for ScriptedTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, message: &OutboundMessage) -> SendAttempt {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.received.push(message.clone());
        let attempt = self
            .script
            .pop_front()
            .unwrap_or(SendAttempt::Accepted { status: 200 });
        debug!(phone = %message.phone, ?attempt, "Scripted send");
        attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(phone: &str) -> OutboundMessage {
        OutboundMessage {
            phone: phone.into(),
            message: "hi".into(),
        }
    }

    #[tokio::test]
    async fn test_script_then_accept() {
        let mut transport = ScriptedTransport::new([SendAttempt::Rejected { status: 500 }]);

        assert_eq!(
            transport.send(&message("1")).await,
            SendAttempt::Rejected { status: 500 }
        );
        assert!(transport.send(&message("2")).await.is_accepted());
        assert_eq!(transport.received().len(), 2);
        assert_eq!(transport.received()[1].phone, "2");
    }
}
