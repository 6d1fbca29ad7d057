/*
 * Responsibility
 * - Boundary to the embedding application (RestApp) and its request dispatcher
 * - Remoting settings read when the handler chain is built
 * - Stock implementations backed by an axum Router
 */
use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, response::Response};
use serde_json::Value;
use tower::ServiceExt;

use crate::error::AppError;
use crate::middleware::jwt_rest::ChainBuildError;
use crate::request::RequestContext;

const CURRENT_CONTEXT_DOCS: &str =
    "https://docs.strongloop.com/display/APIC/Using%20current%20context";

/// Serves the resource once authentication is done (or bypassed).
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, req: &mut RequestContext) -> Result<Response, AppError>;
}

/// The application the handler chain is mounted on.
pub trait RestApp: Send + Sync {
    fn remoting(&self) -> RemotingSettings;

    fn is_auth_enabled(&self) -> bool;

    /// Called once per request.
    fn rest_handler(&self) -> Arc<dyn Dispatcher>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotingSettings {
    /// Removed option; any value other than `false`, `null` included, is a
    /// fatal misconfiguration. `None` means the option was never set.
    pub context: Option<Value>,
}

impl RemotingSettings {
    pub fn ensure_supported(&self) -> Result<(), ChainBuildError> {
        match &self.context {
            None | Some(Value::Bool(false)) => Ok(()),
            Some(_) => Err(ChainBuildError::RemovedOption {
                option: "remoting.context option",
                docs: CURRENT_CONTEXT_DOCS,
            }),
        }
    }
}

/// Dispatches through an axum `Router`.
#[derive(Clone, Debug)]
pub struct RouterDispatcher {
    router: Router,
}

impl RouterDispatcher {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Dispatcher for RouterDispatcher {
    async fn dispatch(&self, req: &mut RequestContext) -> Result<Response, AppError> {
        let request = req.to_http()?;
        match self.router.clone().oneshot(request).await {
            Ok(response) => Ok(response),
            Err(never) => match never {},
        }
    }
}

/// `RestApp` serving a resource router.
#[derive(Clone)]
pub struct RestApplication {
    auth_enabled: bool,
    remoting: RemotingSettings,
    handler: Arc<RouterDispatcher>,
}

impl RestApplication {
    pub fn new(router: Router) -> Self {
        Self {
            auth_enabled: false,
            remoting: RemotingSettings::default(),
            handler: Arc::new(RouterDispatcher::new(router)),
        }
    }

    pub fn enable_auth(mut self, enabled: bool) -> Self {
        self.auth_enabled = enabled;
        self
    }

    pub fn with_remoting(mut self, remoting: RemotingSettings) -> Self {
        self.remoting = remoting;
        self
    }
}

impl RestApp for RestApplication {
    fn remoting(&self) -> RemotingSettings {
        self.remoting.clone()
    }

    fn is_auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    fn rest_handler(&self) -> Arc<dyn Dispatcher> {
        self.handler.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_false_or_absent_is_supported() {
        assert!(RemotingSettings::default().ensure_supported().is_ok());
        let settings = RemotingSettings {
            context: Some(json!(false)),
        };
        assert!(settings.ensure_supported().is_ok());
    }

    #[test]
    fn any_other_context_is_rejected() {
        for value in [
            json!(null),
            json!(true),
            json!({"enableHttpContext": true}),
            json!("x"),
        ] {
            let settings = RemotingSettings {
                context: Some(value),
            };
            let err = settings.ensure_supported().unwrap_err();
            assert!(err.to_string().starts_with("remoting.context option was removed in version 3.0"));
        }
    }
}
