//! Gateway token providers

use std::fmt;

use contracts::{AuthConfig, ContractError, TokenProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{require_env, DispatcherError};

/// Fixed token, usually read from the environment
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_env(var: &str) -> Result<Self, DispatcherError> {
        require_env(var).map(Self::new)
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String, ContractError> {
        Ok(self.token.clone())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token: Option<String>,
}

/// Exchanges a client id and secret for a token
#[derive(Clone)]
pub struct ClientCredentialsProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn from_env(
        client: reqwest::Client,
        token_url: &str,
        client_id_env: &str,
        client_secret_env: &str,
    ) -> Result<Self, DispatcherError> {
        Ok(Self::new(
            client,
            token_url,
            require_env(client_id_env)?,
            require_env(client_secret_env)?,
        ))
    }

    #[instrument(name = "token_fetch", skip(self), fields(url = %self.token_url))]
    async fn fetch(&self) -> Result<String, DispatcherError> {
        let response = self
            .client
            .post(&self.token_url)
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Token endpoint rejected credentials");
            return Err(DispatcherError::TokenStatus {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response.json().await?;
        let token = [body.access_token, body.token]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .ok_or(DispatcherError::TokenMissing)?;

        debug!("Gateway token obtained");
        Ok(token)
    }
}

impl fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenProvider for ClientCredentialsProvider {
    async fn token(&self) -> Result<String, ContractError> {
        Ok(self.fetch().await?)
    }
}

/// Provider selected by `gateway.auth`
#[derive(Debug, Clone)]
pub enum ConfiguredTokenProvider {
    Static(StaticTokenProvider),
    ClientCredentials(ClientCredentialsProvider),
}

impl ConfiguredTokenProvider {
    pub fn from_config(auth: &AuthConfig, client: &reqwest::Client) -> Result<Self, DispatcherError> {
        match auth {
            AuthConfig::Static { token_env } => {
                StaticTokenProvider::from_env(token_env).map(Self::Static)
            }
            AuthConfig::ClientCredentials {
                token_url,
                client_id_env,
                client_secret_env,
            } => ClientCredentialsProvider::from_env(
                client.clone(),
                token_url,
                client_id_env,
                client_secret_env,
            )
            .map(Self::ClientCredentials),
        }
    }
}

impl TokenProvider for ConfiguredTokenProvider {
    async fn token(&self) -> Result<String, ContractError> {
        match self {
            Self::Static(p) => p.token().await,
            Self::ClientCredentials(p) => p.token().await,
        }
    }
}
