//! REST entry point with JWT authentication.
//!
//! ```ignore
//! let app = RestApplication::new(resources).enable_auth(true);
//! let runner = jwt_rest::jwt_rest(AuthOptions::with_secret("..."), Arc::new(app));
//! let router = jwt_rest::apply(Router::new()).with_state(AppState::new(Arc::new(runner)));
//! ```
//!
//! - `jwt_token` builds the authentication step on its own
//! - `jwt_rest` builds the lazily-initialised chain `[jwt-token?, rest]`
//! - `apply` mounts the chain as the fallback of an axum router

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};

use crate::error::AppError;
use crate::request::RequestContext;
use crate::rest::RestApp;
use crate::state::AppState;

mod chain;
mod locator;
mod options;
mod rewrite;
mod token;

pub use chain::{ChainBuildError, ChainRunner, Step};
pub use locator::{
    DEFAULT_COOKIES, DEFAULT_HEADERS, DEFAULT_PARAMS, token_for_request, unwrap_authorization,
};
pub use options::{AuthOptions, CurrentUserLiteral, DEFAULT_CURRENT_USER_LITERAL};
pub use rewrite::UserLiteralRewriter;
pub use token::AuthStep;

/// Authentication step alone (locate → decode → attach → rewrite).
pub fn jwt_token(options: AuthOptions) -> Result<AuthStep, ChainBuildError> {
    AuthStep::new(options)
}

/// Handler chain for `app`: the token step when auth is enabled, then the REST handler.
pub fn jwt_rest(options: AuthOptions, app: Arc<dyn RestApp>) -> ChainRunner {
    ChainRunner::new(options, app)
}

/// Route every request the router does not match itself through the chain.
pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.fallback(rest_api_handler)
}

async fn rest_api_handler(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let ctx = RequestContext::from_http(req, state.cookie_key.as_ref(), state.body_limit).await?;
    state.runner.run(ctx).await
}
