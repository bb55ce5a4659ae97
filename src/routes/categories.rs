use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::category::{Category, CategoryCreateRequest, CategoryUpdateRequest, DbCategory};
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/category",
    tag = "Category",
    request_body = CategoryCreateRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 403, description = "Not authorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreateRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    payload.validate()?;
    let now = utc_now();

    let result = sqlx::query(
        "INSERT INTO categories (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let category = fetch_category(&state.pool, result.last_insert_rowid()).await?;
    tracing::info!(category_id = category.id, "category created");

    Ok((StatusCode::CREATED, Json(category.try_into()?)))
}

#[utoipa::path(
    get,
    path = "/category",
    tag = "Category",
    responses(
        (status = 200, description = "List categories", body = [Category]),
        (status = 403, description = "Not authorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = sqlx::query_as::<_, DbCategory>(
        "SELECT id, name, description, created_at, updated_at, deleted_at FROM categories WHERE deleted_at IS NULL ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;

    let categories: Vec<Category> = categories
        .into_iter()
        .map(Category::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/category/{id}",
    tag = "Category",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category detail", body = Category),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Category not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Category>> {
    let category = fetch_category(&state.pool, id).await?;
    Ok(Json(category.try_into()?))
}

#[utoipa::path(
    patch,
    path = "/category/{id}",
    tag = "Category",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryUpdateRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Category not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdateRequest>,
) -> AppResult<Json<Category>> {
    payload.validate()?;
    let mut category = fetch_category(&state.pool, id).await?;

    if let Some(name) = payload.name.as_ref() {
        category.name = name.clone();
    }
    if payload.description.is_some() {
        category.description = payload.description.clone();
    }

    let now = utc_now();

    sqlx::query("UPDATE categories SET name = ?, description = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(&category.name)
        .bind(&category.description)
        .bind(now)
        .bind(category.id)
        .execute(&state.pool)
        .await?;

    category.updated_at = now;
    Ok(Json(category.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/category/{id}",
    tag = "Category",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category soft deleted, its products detached"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Category not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_category(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    let affected = sqlx::query("UPDATE categories SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("category not found"));
    }

    // Live products must not keep pointing at a deleted category.
    let detached = sqlx::query("UPDATE products SET category_id = NULL, updated_at = ? WHERE category_id = ? AND deleted_at IS NULL")
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(category_id = id, detached = detached.rows_affected(), "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_category(pool: &SqlitePool, id: i64) -> AppResult<DbCategory> {
    sqlx::query_as::<_, DbCategory>(
        "SELECT id, name, description, created_at, updated_at, deleted_at FROM categories WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("category not found"))
}
