use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::{AuthOptions, AuthStep};
use crate::error::AppError;
use crate::request::RequestContext;
use crate::rest::RestApp;

/// One link of the handler chain.
///
/// `Ok(())` hands the request to the next link; `Err` stops the chain.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, req: &mut RequestContext, res: &mut Response) -> Result<(), AppError>;
}

/// Static misconfiguration found while building the chain.
///
/// Cached: every request against the same runner fails with the same error.
#[derive(Debug, Clone, Error)]
pub enum ChainBuildError {
    #[error("{option} was removed in version 3.0. See {docs} for more details.")]
    RemovedOption {
        option: &'static str,
        docs: &'static str,
    },
    #[error("currentUserLiteral cannot be matched: {0}")]
    InvalidUserLiteral(String),
}

/// Last link: hand the request to the application's REST handler.
struct DispatchStep {
    app: Arc<dyn RestApp>,
}

#[async_trait]
impl Step for DispatchStep {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn handle(&self, req: &mut RequestContext, res: &mut Response) -> Result<(), AppError> {
        // A fresh handler per request; the app may swap it at runtime.
        let handler = self.app.rest_handler();
        *res = handler.dispatch(req).await?;
        Ok(())
    }
}

type Chain = Vec<Box<dyn Step>>;

/// Builds the chain on first use and runs it for every request.
pub struct ChainRunner {
    options: AuthOptions,
    app: Arc<dyn RestApp>,
    handlers: OnceCell<Result<Chain, ChainBuildError>>,
}

impl std::fmt::Debug for ChainRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRunner")
            .field("options", &self.options)
            .field("built", &self.handlers.initialized())
            .finish()
    }
}

impl ChainRunner {
    pub fn new(options: AuthOptions, app: Arc<dyn RestApp>) -> Self {
        Self {
            options,
            app,
            handlers: OnceCell::new(),
        }
    }

    /// Step names in execution order, building the chain if needed.
    #[cfg(test)]
    pub async fn step_names(&self) -> Result<Vec<&'static str>, AppError> {
        Ok(self.handlers().await?.iter().map(|h| h.name()).collect())
    }

    /// Run every step in order, stopping at the first error.
    pub async fn run(&self, mut req: RequestContext) -> Result<Response, AppError> {
        let handlers = self.handlers().await?;
        let mut res = Response::default();

        if let [handler] = handlers {
            handler.handle(&mut req, &mut res).await?;
            return Ok(res);
        }

        for handler in handlers {
            if let Err(err) = handler.handle(&mut req, &mut res).await {
                tracing::debug!(step = handler.name(), error = %err, "handler chain stopped");
                return Err(err);
            }
        }

        Ok(res)
    }

    async fn handlers(&self) -> Result<&[Box<dyn Step>], AppError> {
        let built = self.handlers.get_or_init(|| async { self.build() }).await;
        built.as_deref().map_err(|err| AppError::from(err.clone()))
    }

    fn build(&self) -> Result<Chain, ChainBuildError> {
        let built = self.try_build();
        match &built {
            Ok(handlers) => {
                let names: Vec<_> = handlers.iter().map(|h| h.name()).collect();
                tracing::info!(steps = ?names, "rest handler chain built");
            }
            Err(err) => tracing::error!(error = %err, "rest handler chain cannot be built"),
        }
        built
    }

    fn try_build(&self) -> Result<Chain, ChainBuildError> {
        self.app.remoting().ensure_supported()?;

        let mut handlers: Chain = Vec::with_capacity(2);
        if self.app.is_auth_enabled() {
            handlers.push(Box::new(AuthStep::new(self.options.clone())?));
        }
        handlers.push(Box::new(DispatchStep {
            app: self.app.clone(),
        }));

        Ok(handlers)
    }
}
