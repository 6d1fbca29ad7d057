/*
 * Responsibility
 * - v1 URL structure served behind the handler chain
 * - /health (anonymous), /whoami (any identity state), /users/{user_id} (caller required)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, users::get_user, whoami::whoami};

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
        .route("/users/{user_id}", get(get_user))
}
