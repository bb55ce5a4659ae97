use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::login,
        routes::health::health,
        routes::categories::create_category,
        routes::categories::list_categories,
        routes::categories::get_category,
        routes::categories::update_category,
        routes::categories::delete_category,
        routes::products::create_product,
        routes::products::list_products,
        routes::products::get_product,
        routes::products::update_product,
        routes::products::delete_product
    ),
    components(
        schemas(
            models::auth::LoginRequest,
            models::category::Category,
            models::category::CategoryCreateRequest,
            models::category::CategoryUpdateRequest,
            models::product::Product,
            models::product::ProductCreateRequest,
            models::product::ProductUpdateRequest,
            routes::health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Credential exchange with the identity provider"),
        (name = "Category", description = "Category management"),
        (name = "Product", description = "Product management"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
