/*
 * Responsibility
 * - Identity slot carried by every request (Unset / Denied / Identity)
 * - Ambient per-request sink that mirrors the attached identity to other collaborators
 */
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use serde::Serialize;

use crate::services::auth::IdentityToken;

/// Who the request has been authenticated as, so far.
///
/// - `Unset`: nobody looked yet.
/// - `Denied`: an earlier step decided there is no identity (explicit marker).
/// - `Identity`: decoded claims are attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "token", rename_all = "lowercase")]
pub enum IdentitySlot {
    #[default]
    Unset,
    Denied,
    Identity(IdentityToken),
}

impl IdentitySlot {
    pub fn is_populated(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn token(&self) -> Option<&IdentityToken> {
        match self {
            Self::Identity(token) => Some(token),
            _ => None,
        }
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.token().and_then(IdentityToken::caller_id)
    }
}

/// Side channel notified whenever the auth step attaches an identity.
pub trait IdentitySink: Send + Sync {
    fn is_active(&self) -> bool;

    fn set_access_token(&self, token: Option<&IdentityToken>);
}

/// Per-request scope implementing [`IdentitySink`].
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct RequestScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    active: AtomicBool,
    access_token: Mutex<Option<IdentityToken>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                active: AtomicBool::new(true),
                access_token: Mutex::new(None),
            }),
        }
    }

    pub fn deactivate(&self) {
        self.inner.active.store(false, Ordering::Release);
    }

    pub fn access_token(&self) -> Option<IdentityToken> {
        self.inner.access_token.lock().clone()
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySink for RequestScope {
    fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    fn set_access_token(&self, token: Option<&IdentityToken>) {
        *self.inner.access_token.lock() = token.cloned();
    }
}
