//! Per-request ambient scope.
//!
//! Opens a [`RequestScope`] before the handler chain runs and closes it once
//! the response is produced. The token step mirrors the attached identity
//! into it through the `Arc<dyn IdentitySink>` extension.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::request::{IdentitySink, RequestScope};

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(scope_middleware))
}

async fn scope_middleware(mut req: Request<Body>, next: Next) -> Response {
    let scope = RequestScope::new();
    let sink: Arc<dyn IdentitySink> = Arc::new(scope.clone());

    req.extensions_mut().insert(scope.clone());
    req.extensions_mut().insert(sink);

    let res = next.run(req).await;

    // Clones that outlive the request must not receive identities anymore.
    scope.deactivate();
    tracing::debug!(
        caller = ?scope.access_token().and_then(|t| t.user_id),
        status = %res.status(),
        "request scope closed"
    );

    res
}
