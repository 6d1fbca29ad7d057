/*
 * Responsibility
 * - Load Config → build the handler chain → assemble the gateway Router
 * - Apply middleware (request scope, HTTP layers)
 * - Start with axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, jwt_rest};
use crate::rest::RestApplication;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,jwt_rest_server=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash so it gets noticed. Production: keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Resource routes wrapped in a `RestApplication`, behind the handler chain.
pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let resources = Router::new().nest("/api/v1", api::v1::routes());

    let rest_app = RestApplication::new(resources)
        .enable_auth(config.auth_enabled)
        .with_remoting(config.remoting.clone());

    // Built lazily on the first request; misconfiguration surfaces there.
    let runner = jwt_rest::jwt_rest(config.auth.clone(), Arc::new(rest_app));

    Ok(AppState::new(Arc::new(runner))
        .with_cookie_key(config.cookie_key()?)
        .with_body_limit(config.body_limit))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let router = Router::new().route("/health", get(health));
    let router = jwt_rest::apply(router).with_state(state);
    let router = middleware::scope::apply(router);

    middleware::http::apply(router, config.body_limit, config.request_timeout)
}
