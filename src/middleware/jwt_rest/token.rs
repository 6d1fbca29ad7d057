use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use super::{AuthOptions, ChainBuildError, Step, UserLiteralRewriter, locator};
use crate::error::AppError;
use crate::request::{IdentitySlot, RequestContext};
use crate::services::auth::{JwtDecoder, TokenDecoder};

/// Locate → decode → attach → rewrite.
///
/// Built once per options set and shared by every request afterwards.
pub struct AuthStep {
    options: AuthOptions,
    decoder: Arc<dyn TokenDecoder>,
    rewriter: Option<UserLiteralRewriter>,
}

impl std::fmt::Debug for AuthStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStep")
            .field("options", &self.options)
            .field("rewriter", &self.rewriter.as_ref().map(UserLiteralRewriter::literal))
            .finish()
    }
}

impl AuthStep {
    pub fn new(options: AuthOptions) -> Result<Self, ChainBuildError> {
        let decoder = Arc::new(JwtDecoder::new(options.secret.as_deref()));
        Self::with_decoder(options, decoder)
    }

    pub fn with_decoder(
        options: AuthOptions,
        decoder: Arc<dyn TokenDecoder>,
    ) -> Result<Self, ChainBuildError> {
        let rewriter = options
            .current_user_literal
            .as_str()
            .map(UserLiteralRewriter::new)
            .transpose()
            .map_err(|e| ChainBuildError::InvalidUserLiteral(e.to_string()))?;

        tracing::debug!(
            model = ?options.model,
            current_user_literal = ?rewriter.as_ref().map(UserLiteralRewriter::literal),
            "token step configured"
        );

        Ok(Self {
            options,
            decoder,
            rewriter,
        })
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Authenticate one request in place.
    ///
    /// - an identity populated upstream is kept unless double-checking allows a new search
    /// - no credential: the request continues anonymously
    /// - undecodable credential: `Err`, nothing attached, url untouched
    pub fn authenticate(&self, req: &mut RequestContext) -> Result<(), AppError> {
        if req.access_token.is_populated() {
            if !self.options.enable_doublecheck {
                tracing::debug!("access token already set upstream, skipping credential search");
                self.rewrite(req);
                return Ok(());
            }
            // Keyed on the caller id (`userId`), not the token's own `id`: an
            // identity carrying only an `id` is searched again.
            if req.access_token.caller_id().is_some() && !self.options.overwrite_existing_token {
                tracing::debug!("upstream identity kept, overwriteExistingToken is off");
                self.rewrite(req);
                return Ok(());
            }
        }

        let Some(raw) = locator::token_for_request(req, &self.options).filter(|t| !t.is_empty())
        else {
            tracing::debug!("no access token found, continuing anonymously");
            return Ok(());
        };

        let decoded = self.decoder.decode(&raw).map_err(|err| {
            tracing::warn!(error = %err, "access token could not be decoded");
            AppError::from(err)
        })?;

        req.access_token = match decoded {
            Some(token) => IdentitySlot::Identity(token),
            None => IdentitySlot::Denied,
        };
        self.rewrite(req);

        if let Some(scope) = req.scope.as_ref().filter(|scope| scope.is_active()) {
            scope.set_access_token(req.access_token.token());
        }

        Ok(())
    }

    fn rewrite(&self, req: &mut RequestContext) {
        if let Some(rewriter) = &self.rewriter {
            rewriter.rewrite(req);
        }
    }
}

#[async_trait]
impl Step for AuthStep {
    fn name(&self) -> &'static str {
        "jwt-token"
    }

    async fn handle(&self, req: &mut RequestContext, _res: &mut Response) -> Result<(), AppError> {
        self.authenticate(req)
    }
}
