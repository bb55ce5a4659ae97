use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{AuthorizationProvider, IdentityProvider, ProviderError};
use crate::config::ProviderConfig;

const UMA_TICKET_GRANT: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";
const PASSWORD_GRANT: &str = "password";

/// Body returned by the token endpoint when `response_mode=decision`.
#[derive(Debug, Deserialize)]
struct DecisionResponse {
    result: bool,
}

/// HTTP client for a Keycloak realm.
#[derive(Clone)]
pub struct KeycloakClient {
    client: Client,
    config: ProviderConfig,
}

impl KeycloakClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AuthorizationProvider for KeycloakClient {
    async fn evaluate(&self, token: &str, permission: &str) -> Result<bool, ProviderError> {
        let url = self.config.token_url();
        tracing::debug!(url = %url, permission = %permission, "querying provider decision");

        let form = [
            ("grant_type", UMA_TICKET_GRANT),
            ("audience", self.config.client_id.as_str()),
            ("permission", permission),
            ("response_mode", "decision"),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::InvalidStatus(status));
        }

        let body = response.bytes().await?;
        let decision: DecisionResponse =
            serde_json::from_slice(&body).map_err(|err| ProviderError::Parse(err.to_string()))?;

        Ok(decision.result)
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    async fn exchange_password(&self, username: &str, password: &str) -> Result<Value, ProviderError> {
        let url = self.config.token_url();
        tracing::debug!(url = %url, username = %username, "exchanging password credential");

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", PASSWORD_GRANT),
            ("username", username),
            ("password", password),
        ];

        let response = self.client.post(&url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::InvalidStatus(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ProviderError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/realms/shop/protocol/openid-connect/token";

    fn client_for(server: &MockServer) -> KeycloakClient {
        KeycloakClient::new(ProviderConfig {
            base_url: server.uri(),
            realm: "shop".to_string(),
            client_id: "catalog-api".to_string(),
            client_secret: "s3cret".to_string(),
            scope: "openid".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn evaluate_sends_uma_decision_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(header("authorization", "Bearer abc"))
            .and(body_string_contains("permission=category%23create"))
            .and(body_string_contains("audience=catalog-api"))
            .and(body_string_contains("response_mode=decision"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": true})))
            .expect(1)
            .mount(&server)
            .await;

        let allowed = client_for(&server).evaluate("abc", "category#create").await.unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn evaluate_reports_negative_decision() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": false})))
            .mount(&server)
            .await;

        let allowed = client_for(&server).evaluate("abc", "product#read").await.unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn evaluate_rejects_error_status_and_garbage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("permission=product%23delete"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "access_denied"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("permission=product%23update"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.evaluate("abc", "product#delete").await,
            Err(ProviderError::InvalidStatus(StatusCode::FORBIDDEN))
        ));
        assert!(matches!(
            client.evaluate("abc", "product#update").await,
            Err(ProviderError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn evaluate_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"result": true}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).evaluate("abc", "category#read").await;
        assert!(matches!(result, Err(ProviderError::Request(_))));
    }

    #[tokio::test]
    async fn exchange_password_returns_body_verbatim() {
        let server = MockServer::start().await;
        let token = serde_json::json!({
            "access_token": "eyJ...",
            "expires_in": 300,
            "token_type": "Bearer",
            "not-before-policy": 0
        });
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=userone%40test.com"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token.clone()))
            .mount(&server)
            .await;

        let body = client_for(&server)
            .exchange_password("userone@test.com", "123456")
            .await
            .unwrap();
        assert_eq!(body, token);
    }

    #[tokio::test]
    async fn exchange_password_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let result = client_for(&server).exchange_password("userone@test.com", "wrong1").await;
        assert!(matches!(
            result,
            Err(ProviderError::InvalidStatus(StatusCode::UNAUTHORIZED))
        ));
    }
}
