//! HttpTransport - bearer-authenticated JSON POST to the messaging gateway

use contracts::{GatewayConfig, MessageTransport, OutboundMessage, SendAttempt, TokenProvider};
use tracing::{debug, error, instrument, warn};

use crate::error::DispatcherError;

/// HTTP client with the gateway's per-request timeout
pub fn build_client(gateway: &GatewayConfig) -> Result<reqwest::Client, DispatcherError> {
    Ok(reqwest::Client::builder()
        .timeout(gateway.request_timeout())
        .build()?)
}

/// Sends each message as `POST {send_url}?cid={client_id}`
///
/// The token is fetched on the first send and reused; a 401 drops it so the
/// next send fetches a fresh one.
pub struct HttpTransport<P> {
    name: String,
    client: reqwest::Client,
    send_url: String,
    client_id: String,
    tokens: P,
    token: Option<String>,
}

impl<P> HttpTransport<P>
where
    P: TokenProvider + Send + Sync,
{
    pub fn new(client: reqwest::Client, gateway: &GatewayConfig, tokens: P) -> Self {
        Self {
            name: "http".to_string(),
            client,
            send_url: gateway.send_url.clone(),
            client_id: gateway.client_id.clone(),
            tokens,
            token: None,
        }
    }

    /// Whether a token is currently cached
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn bearer(&mut self) -> Result<String, contracts::ContractError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let token = self.tokens.token().await?;
        self.token = Some(token.clone());
        Ok(token)
    }
}

impl<P> MessageTransport for HttpTransport<P>
where
    P: TokenProvider + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_transport_send",
        skip(self, message),
        fields(transport = %self.name, phone = %message.phone)
    )]
    async fn send(&mut self, message: &OutboundMessage) -> SendAttempt {
        let token = match self.bearer().await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to obtain gateway token");
                return SendAttempt::NoResponse {
                    reason: e.to_string(),
                };
            }
        };

        let response = self
            .client
            .post(&self.send_url)
            .query(&[("cid", self.client_id.as_str())])
            .bearer_auth(token)
            .json(message)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(status = status.as_u16(), "Gateway accepted message");
                } else {
                    warn!(status = status.as_u16(), "Gateway rejected message");
                }
                if status == reqwest::StatusCode::UNAUTHORIZED {
                    self.token = None;
                }
                SendAttempt::from_status(status.as_u16())
            }
            Err(e) => {
                error!(error = %e, "Gateway request failed");
                SendAttempt::NoResponse {
                    reason: e.to_string(),
                }
            }
        }
    }
}
