use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the identity and authorization provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let timeout_secs = std::env::var("KEYCLOAK_TIMEOUT_SECS")
            .map(|val| val.parse::<u64>())
            .unwrap_or(Ok(DEFAULT_TIMEOUT_SECS))
            .map_err(|_| AppError::configuration("KEYCLOAK_TIMEOUT_SECS must be a valid integer"))?;
        if timeout_secs == 0 {
            return Err(AppError::configuration("KEYCLOAK_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Self {
            base_url: required("KEYCLOAK_URL")?.trim_end_matches('/').to_string(),
            realm: required("KEYCLOAK_REALM")?,
            client_id: required("KEYCLOAK_CLIENT_ID")?,
            client_secret: required("KEYCLOAK_CLIENT_SECRET")?,
            scope: std::env::var("KEYCLOAK_SCOPE").unwrap_or_else(|_| "openid".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Token endpoint shared by the password grant and the UMA decision query.
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url, self.realm
        )
    }
}

fn required(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::configuration(format!("{name} not set")))
}
