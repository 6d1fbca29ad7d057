/*
 * Responsibility
 * - Shared context of the gateway router (AppState)
 *   - the handler chain, the signed-cookie key, the body size limit
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use crate::middleware::jwt_rest::ChainRunner;

/// Matches the body limit of the HTTP layer.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<ChainRunner>,
    pub cookie_key: Option<Key>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(runner: Arc<ChainRunner>) -> Self {
        Self {
            runner,
            cookie_key: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_cookie_key(mut self, key: Option<Key>) -> Self {
        self.cookie_key = key;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}
