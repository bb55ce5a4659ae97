use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::auth::LoginRequest;

/// Exchange an identifier/password pair for a provider token.
///
/// The provider's token response is returned untouched. Every failure,
/// whether the provider rejected the pair or could not be reached, maps to
/// the same `invalid credentials` answer.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Provider token response"),
        (status = 400, description = "Identifier or password fails validation"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> AppResult<Json<Value>> {
    payload.validate()?;

    match state
        .identity
        .exchange_password(&payload.identifier, &payload.password)
        .await
    {
        Ok(token) => Ok(Json(token)),
        Err(err) => {
            tracing::warn!(identifier = %payload.identifier, error = %err, "credential exchange failed");
            Err(AppError::unauthorized("invalid credentials"))
        }
    }
}
