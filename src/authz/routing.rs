//! Route registration with attached authorization declarations.
//!
//! Every handler registered through a [`RouteGroup`] is wrapped in one
//! middleware stage that runs the [`AuthorizationGuard`] with the group's
//! and the handler's [`Metadata`], captured when the route is registered.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::handler::Handler;
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{self, MethodRouter};
use axum::Router;

use super::guard::{AuthorizationDecision, AuthorizationGuard};
use super::metadata::Metadata;
use super::resolver::{resolve, ResolvedOutcome};
use crate::errors::AppError;

/// Declarations visible to the guard for one matched handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMetadata {
    pub group: Metadata,
    pub handler: Metadata,
}

impl RouteMetadata {
    pub fn resolve(&self) -> ResolvedOutcome {
        resolve(&self.group, &self.handler)
    }
}

/// One row of the registered route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    pub metadata: RouteMetadata,
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effective = match self.metadata.resolve() {
            ResolvedOutcome::Exempt => "public".to_string(),
            ResolvedOutcome::Requirement(permission) => permission.query(),
            ResolvedOutcome::Unresolved => "unresolved (always denied)".to_string(),
        };
        write!(f, "{:<7} {:<24} {}", self.method.as_str(), self.path, effective)
    }
}

#[derive(Clone)]
struct GuardedRoute {
    guard: AuthorizationGuard,
    metadata: RouteMetadata,
    name: Arc<str>,
}

async fn authorize(State(route): State<GuardedRoute>, request: Request, next: Next) -> Response {
    match route.guard.decide(request.headers(), &route.metadata).await {
        AuthorizationDecision::Allow => next.run(request).await,
        AuthorizationDecision::Deny(reason) => {
            tracing::debug!(route = %route.name, reason = %reason, "request denied");
            AppError::not_authorized().into_response()
        }
    }
}

struct PendingRoute<S> {
    method: Method,
    path: String,
    route: MethodRouter<S>,
    metadata: Metadata,
}

/// A set of handlers sharing a path prefix and group-level declarations.
///
/// Group declarations are applied when the group is turned into a router,
/// so they may be made before or after handlers are added.
pub struct RouteGroup<S> {
    prefix: &'static str,
    metadata: Metadata,
    guard: AuthorizationGuard,
    routes: Vec<PendingRoute<S>>,
}

impl<S> RouteGroup<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(prefix: &'static str, guard: AuthorizationGuard) -> Self {
        Self {
            prefix,
            metadata: Metadata::new(),
            guard,
            routes: Vec::new(),
        }
    }

    pub fn require_permission(mut self, requirement: super::PermissionRequirement) -> Self {
        self.metadata = self.metadata.require_permission(requirement);
        self
    }

    pub fn mark_public(mut self) -> Self {
        self.metadata = self.metadata.mark_public();
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H, metadata: Metadata) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::GET, path, routing::get(handler), metadata)
    }

    pub fn post<H, T>(self, path: &str, handler: H, metadata: Metadata) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::POST, path, routing::post(handler), metadata)
    }

    pub fn patch<H, T>(self, path: &str, handler: H, metadata: Metadata) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::PATCH, path, routing::patch(handler), metadata)
    }

    pub fn delete<H, T>(self, path: &str, handler: H, metadata: Metadata) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::DELETE, path, routing::delete(handler), metadata)
    }

    fn add(mut self, method: Method, path: &str, route: MethodRouter<S>, metadata: Metadata) -> Self {
        let path = match format!("{}{}", self.prefix, path) {
            full if full.is_empty() => "/".to_string(),
            full => full,
        };

        self.routes.push(PendingRoute {
            method,
            path,
            route,
            metadata,
        });
        self
    }

    /// Build the router and the table of what was registered.
    pub fn into_parts(self) -> (Router<S>, Vec<RouteEntry>) {
        let mut router = Router::new();
        let mut table = Vec::with_capacity(self.routes.len());

        for pending in self.routes {
            let metadata = RouteMetadata {
                group: self.metadata,
                handler: pending.metadata,
            };
            let guarded = GuardedRoute {
                guard: self.guard.clone(),
                metadata,
                name: format!("{} {}", pending.method, pending.path).into(),
            };

            let route = pending
                .route
                .route_layer(middleware::from_fn_with_state(guarded, authorize));
            router = router.route(&pending.path, route);

            table.push(RouteEntry {
                method: pending.method,
                path: pending.path,
                metadata,
            });
        }

        (router, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{PermissionRequirement, Resource, Scope};
    use crate::provider::{AuthorizationProvider, ProviderError};
    use async_trait::async_trait;
    use axum::body::{self, Body};
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct AllowCategoryRead;

    #[async_trait]
    impl AuthorizationProvider for AllowCategoryRead {
        async fn evaluate(&self, _token: &str, permission: &str) -> Result<bool, ProviderError> {
            Ok(permission == "category#read")
        }
    }

    fn guard() -> AuthorizationGuard {
        AuthorizationGuard::new(Arc::new(AllowCategoryRead))
    }

    async fn send(router: &Router, method: Method, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let resp = router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn denied_handler_never_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let (router, _) = RouteGroup::<()>::new("/category", guard())
            .require_permission(PermissionRequirement::resource(Resource::Category))
            .delete(
                "/:id",
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "deleted"
                },
                Metadata::new().require_permission(PermissionRequirement::scope(Scope::Delete)),
            )
            .into_parts();

        let (status, _) = send(&router, Method::DELETE, "/category/1", Some("Bearer tok")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn allowed_handler_runs_and_public_handler_skips_guard() {
        let (router, table) = RouteGroup::<()>::new("/category", guard())
            .get(
                "/:id",
                || async { "one" },
                Metadata::new().require_permission(PermissionRequirement::new(Resource::Category, Scope::Read)),
            )
            .get("", || async { "open" }, Metadata::new().mark_public())
            .into_parts();

        assert_eq!(
            send(&router, Method::GET, "/category/7", Some("Bearer tok")).await,
            (StatusCode::OK, "one".to_string())
        );
        assert_eq!(
            send(&router, Method::GET, "/category", None).await,
            (StatusCode::OK, "open".to_string())
        );

        let paths: Vec<_> = table.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec!["/category/:id", "/category"]);
    }

    #[tokio::test]
    async fn every_denial_has_the_same_body() {
        let (router, _) = RouteGroup::<()>::new("/product", guard())
            .get("", || async { "all" }, Metadata::new())
            .post(
                "",
                || async { "made" },
                Metadata::new().require_permission(PermissionRequirement::new(Resource::Product, Scope::Create)),
            )
            .into_parts();

        let missing = send(&router, Method::POST, "/product", None).await;
        let scheme = send(&router, Method::POST, "/product", Some("Basic abc")).await;
        let refused = send(&router, Method::POST, "/product", Some("Bearer tok")).await;
        let undeclared = send(&router, Method::GET, "/product", Some("Bearer tok")).await;

        assert_eq!(missing.0, StatusCode::FORBIDDEN);
        assert_eq!(missing, scheme);
        assert_eq!(missing, refused);
        assert_eq!(missing, undeclared);
    }

    #[test]
    fn group_declaration_applies_regardless_of_order() {
        let (_, table) = RouteGroup::<()>::new("/product", guard())
            .patch(
                "/:id",
                || async {},
                Metadata::new().require_permission(PermissionRequirement::scope(Scope::Update)),
            )
            .require_permission(PermissionRequirement::resource(Resource::Product))
            .into_parts();

        assert_eq!(table.len(), 1);
        assert_eq!(table[0].to_string().split_whitespace().last(), Some("product#update"));
    }
}
