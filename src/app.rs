use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AuthorizationGuard, Metadata, PermissionRequirement, Resource, RouteEntry, RouteGroup, Scope};
use crate::config::ProviderConfig;
use crate::docs;
use crate::errors::AppError;
use crate::provider::{AuthorizationProvider, IdentityProvider, KeycloakClient};
use crate::routes::{auth, categories, health, products};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(pool: SqlitePool, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { pool, identity }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = ProviderConfig::from_env()?;
    create_app_with_config(pool, config)
}

pub fn create_app_with_config(pool: SqlitePool, config: ProviderConfig) -> Result<Router, AppError> {
    let client = KeycloakClient::new(config)
        .map_err(|err| AppError::configuration(format!("failed to build provider client: {err}")))?;
    let client = Arc::new(client);

    Ok(create_app_with_providers(pool, client.clone(), client))
}

pub fn create_app_with_providers(
    pool: SqlitePool,
    authorization: Arc<dyn AuthorizationProvider>,
    identity: Arc<dyn IdentityProvider>,
) -> Router {
    let guard = AuthorizationGuard::new(authorization);
    let (router, table) = routes(guard);
    for entry in &table {
        tracing::debug!(route = %entry, "registered route");
    }

    let state = AppState::new(pool, identity);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Every route with its authorization declarations.
pub fn routes(guard: AuthorizationGuard) -> (Router<AppState>, Vec<RouteEntry>) {
    let auth_routes = RouteGroup::<AppState>::new("/auth", guard.clone())
        .mark_public()
        .post("/login", auth::login, Metadata::new());

    let api_routes = RouteGroup::<AppState>::new("/api", guard.clone())
        .get("/health", health::health, Metadata::new().mark_public());

    let docs_routes = RouteGroup::<AppState>::new("/api-docs", guard.clone())
        .get("/openapi.json", docs::openapi_json, Metadata::new().mark_public());

    // Each handler names resource and scope itself.
    let category_routes = RouteGroup::<AppState>::new("/category", guard.clone())
        .post(
            "",
            categories::create_category,
            Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Create)),
        )
        .get(
            "",
            categories::list_categories,
            Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Reads)),
        )
        .get(
            "/:id",
            categories::get_category,
            Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Read)),
        )
        .patch(
            "/:id",
            categories::update_category,
            Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Update)),
        )
        .delete(
            "/:id",
            categories::delete_category,
            Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Delete)),
        );

    // Resource declared once on the group, scope per handler.
    let product_routes = RouteGroup::<AppState>::new("/product", guard)
        .require_permission(PermissionRequirement::resource(Resource::Product))
        .post(
            "",
            products::create_product,
            Metadata::new().require_permission(PermissionRequirement::scope(Scope::Create)),
        )
        .get(
            "",
            products::list_products,
            Metadata::new().require_permission(PermissionRequirement::scope(Scope::Reads)),
        )
        .get(
            "/:id",
            products::get_product,
            Metadata::new().require_permission(PermissionRequirement::scope(Scope::Read)),
        )
        .patch(
            "/:id",
            products::update_product,
            Metadata::new().require_permission(PermissionRequirement::scope(Scope::Update)),
        )
        .delete(
            "/:id",
            products::delete_product,
            Metadata::new().require_permission(PermissionRequirement::scope(Scope::Delete)),
        );

    let mut router = Router::new();
    let mut table = Vec::new();
    for group in [auth_routes, api_routes, docs_routes, category_routes, product_routes] {
        let (group_router, entries) = group.into_parts();
        router = router.merge(group_router);
        table.extend(entries);
    }

    (router, table)
}
