/*
 * Responsibility
 * - GET /api/v1/users/{user_id}
 * - `/users/me` arrives here already rewritten to the caller's id
 */
use axum::{Json, extract::Path};

use crate::api::v1::{dto::users::UserResponse, extractors::AuthCtxExtractor};
use crate::error::AppError;

pub async fn get_user(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::not_found("user"));
    }

    tracing::debug!(caller = %ctx.user_id, %user_id, "user lookup");

    Ok(Json(UserResponse {
        is_caller: user_id == ctx.user_id,
        id: user_id,
        token_id: ctx.token_id,
    }))
}
