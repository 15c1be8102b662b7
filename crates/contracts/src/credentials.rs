//! Injected credential capabilities
//!
//! Neither secrets nor comparison logic live in the pipeline crates.

use crate::ContractError;

/// Operator login check
pub trait CredentialVerifier: Send + Sync {
    /// Whether `password` is valid for `username`
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Bearer token source for the messaging gateway
#[trait_variant::make(TokenProvider: Send)]
pub trait LocalTokenProvider {
    /// Obtain a token
    ///
    /// # Errors
    /// Returns an error when the token cannot be obtained; callers treat the
    /// affected send as having received no response.
    async fn token(&self) -> Result<String, ContractError>;
}
