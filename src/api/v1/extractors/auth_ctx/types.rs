/*
 * Responsibility
 * - Authenticated context as seen by handlers
 * - derived from the IdentitySlot the handler chain forwards in the request extensions
 */
use serde_json::{Map, Value};

use crate::services::auth::IdentityToken;

/// Caller of an authenticated request.
///
/// - `user_id` is the caller identifier carried by the token
/// - `token_id` is the token's own identifier, when it has one
/// - `claims` keeps every other claim for handlers that need them
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: String,
    pub token_id: Option<String>,
    pub claims: Map<String, Value>,
}

impl AuthCtx {
    /// `None` when the token names no caller.
    pub fn from_token(token: &IdentityToken) -> Option<Self> {
        Some(Self {
            user_id: token.caller_id()?.to_string(),
            token_id: token.id.clone(),
            claims: token.claims.clone(),
        })
    }
}
