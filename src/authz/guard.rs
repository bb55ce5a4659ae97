use std::fmt;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use super::resolver::{resolve, ResolvedOutcome};
use super::routing::RouteMetadata;
use crate::provider::AuthorizationProvider;

/// Why a request was refused. Only ever logged; callers see a generic 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredential,
    UnsupportedScheme,
    NoPermissionDeclared,
    ProviderDenied,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DenyReason::MissingCredential => "missing credential",
            DenyReason::UnsupportedScheme => "unsupported scheme",
            DenyReason::NoPermissionDeclared => "no permission declared",
            DenyReason::ProviderDenied => "provider denied or unreachable",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allow,
    Deny(DenyReason),
}

/// `<scheme> <token>` as sent in the authorization header.
#[derive(Debug, PartialEq, Eq)]
pub struct IncomingCredential<'a> {
    pub scheme: &'a str,
    pub token: &'a str,
}

impl<'a> IncomingCredential<'a> {
    /// Split on the first space; extra spaces before the token are skipped.
    /// A value without a token is rejected.
    pub fn parse(value: &'a str) -> Option<Self> {
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim_start();
        if token.is_empty() {
            return None;
        }
        Some(Self { scheme, token })
    }

    pub fn is_bearer(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("bearer")
    }
}

/// Per-request gatekeeper. Holds no request state; clones share the provider.
#[derive(Clone)]
pub struct AuthorizationGuard {
    provider: Arc<dyn AuthorizationProvider>,
}

impl AuthorizationGuard {
    pub fn new(provider: Arc<dyn AuthorizationProvider>) -> Self {
        Self { provider }
    }

    pub async fn decide(&self, headers: &HeaderMap, route: &RouteMetadata) -> AuthorizationDecision {
        let outcome = resolve(&route.group, &route.handler);
        if outcome == ResolvedOutcome::Exempt {
            return AuthorizationDecision::Allow;
        }

        let Some(value) = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
            return AuthorizationDecision::Deny(DenyReason::MissingCredential);
        };

        let Some(credential) = IncomingCredential::parse(value) else {
            return AuthorizationDecision::Deny(DenyReason::MissingCredential);
        };

        if !credential.is_bearer() {
            return AuthorizationDecision::Deny(DenyReason::UnsupportedScheme);
        }

        let ResolvedOutcome::Requirement(permission) = outcome else {
            return AuthorizationDecision::Deny(DenyReason::NoPermissionDeclared);
        };

        let query = permission.query();
        match self.provider.evaluate(credential.token, &query).await {
            Ok(true) => {
                tracing::debug!(permission = %query, "provider granted permission");
                AuthorizationDecision::Allow
            }
            Ok(false) => {
                tracing::debug!(permission = %query, "provider refused permission");
                AuthorizationDecision::Deny(DenyReason::ProviderDenied)
            }
            Err(err) => {
                tracing::warn!(permission = %query, error = %err, "provider call failed");
                AuthorizationDecision::Deny(DenyReason::ProviderDenied)
            }
        }
    }
}
