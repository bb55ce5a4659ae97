//! Outbound client for the identity and authorization provider.
//!
//! Two capabilities are consumed: evaluating a `resource#scope` permission for
//! a bearer token, and exchanging a password credential for a token. Both are
//! traits so the guard and the login route can be driven by a fake in tests.

mod keycloak;

pub use keycloak::KeycloakClient;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to send request to provider: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider responded with status: {0}")]
    InvalidStatus(StatusCode),
    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

/// Evaluates a permission query on behalf of the caller's token.
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Returns `Ok(true)` only on an explicit affirmative decision.
    async fn evaluate(&self, token: &str, permission: &str) -> Result<bool, ProviderError>;
}

/// Exchanges a username/password pair for a token payload.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_password(&self, username: &str, password: &str) -> Result<Value, ProviderError>;
}
