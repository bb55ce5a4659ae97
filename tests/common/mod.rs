#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_gate::config::ProviderConfig;
use catalog_gate::create_app_with_config;
use catalog_gate::db;

pub const REALM: &str = "shop";
pub const CLIENT_ID: &str = "catalog-api";
pub const TOKEN_PATH: &str = "/realms/shop/protocol/openid-connect/token";

/// Encoded `permission` form field, anchored on the following `&` so that
/// `category#read` does not also match `category#reads`.
pub fn permission_field(permission: &str) -> String {
    format!("permission={}&", permission.replace('#', "%23"))
}

/// Router wired to a temp SQLite database and a mock identity provider.
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub provider: MockServer,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let pool = db::connect(&url, 4).await?;

        let provider = MockServer::start().await;
        let config = ProviderConfig {
            base_url: provider.uri(),
            realm: REALM.to_string(),
            client_id: CLIENT_ID.to_string(),
            client_secret: "s3cret".to_string(),
            scope: "openid".to_string(),
            timeout: Duration::from_millis(500),
        };
        let app = create_app_with_config(pool.clone(), config)?;

        Ok(Self {
            app,
            pool,
            provider,
            _dir: dir,
        })
    }

    /// Answer decision queries for `permission` with `result`.
    pub async fn decide(&self, permission: &str, result: bool) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains(permission_field(permission)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.provider)
            .await;
    }

    pub async fn allow(&self, permission: &str) {
        self.decide(permission, true).await;
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            builder = builder.header("authorization", authorization);
        }

        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, value))
    }

    pub async fn insert_category(&self, name: &str) -> Result<i64> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at, updated_at) VALUES (?, NULL, ?, ?)",
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn live_categories(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(1) FROM categories WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
