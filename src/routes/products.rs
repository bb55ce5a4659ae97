use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::product::{DbProduct, Product, ProductCreateRequest, ProductUpdateRequest};
use crate::routes::categories::fetch_category;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/product",
    tag = "Product",
    request_body = ProductCreateRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Unknown category or invalid price"),
        (status = 403, description = "Not authorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductCreateRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    payload.validate()?;
    ensure_category(&state.pool, payload.category_id).await?;
    let now = utc_now();

    let result = sqlx::query(
        "INSERT INTO products (category_id, name, description, price, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.category_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let product = fetch_product(&state.pool, result.last_insert_rowid()).await?;
    tracing::info!(product_id = product.id, "product created");

    Ok((StatusCode::CREATED, Json(product.try_into()?)))
}

#[utoipa::path(
    get,
    path = "/product",
    tag = "Product",
    responses(
        (status = 200, description = "List products", body = [Product]),
        (status = 403, description = "Not authorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, DbProduct>(
        "SELECT id, category_id, name, description, price, created_at, updated_at, deleted_at FROM products WHERE deleted_at IS NULL ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;

    let products: Vec<Product> = products
        .into_iter()
        .map(Product::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = Product),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_product(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Product>> {
    let product = fetch_product(&state.pool, id).await?;
    Ok(Json(product.try_into()?))
}

#[utoipa::path(
    patch,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Unknown category or invalid price"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdateRequest>,
) -> AppResult<Json<Product>> {
    payload.validate()?;
    let mut product = fetch_product(&state.pool, id).await?;

    if let Some(name) = payload.name.as_ref() {
        product.name = name.clone();
    }
    if payload.description.is_some() {
        product.description = payload.description.clone();
    }
    if let Some(price) = payload.price {
        product.price = price;
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(&state.pool, category_id).await?;
        product.category_id = category_id;
    }

    let now = utc_now();

    sqlx::query(
        "UPDATE products SET category_id = ?, name = ?, description = ?, price = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(now)
    .bind(product.id)
    .execute(&state.pool)
    .await?;

    product.updated_at = now;
    Ok(Json(product.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product soft deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let now = utc_now();
    let affected = sqlx::query("UPDATE products SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("product not found"));
    }

    tracing::info!(product_id = id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_product(pool: &SqlitePool, id: i64) -> AppResult<DbProduct> {
    sqlx::query_as::<_, DbProduct>(
        "SELECT id, category_id, name, description, price, created_at, updated_at, deleted_at FROM products WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("product not found"))
}

async fn ensure_category(pool: &SqlitePool, category_id: Option<i64>) -> AppResult<()> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    match fetch_category(pool, category_id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!("category {category_id} does not exist"))),
        Err(err) => Err(err),
    }
}
