use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::request::IdentitySlot;

use super::AuthCtx;

/// Extractor for handlers that require a caller.
///
/// Reads the `IdentitySlot` the handler chain forwards; an anonymous, denied
/// or caller-less request is rejected with 401.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentitySlot>()
            .and_then(IdentitySlot::token)
            .and_then(AuthCtx::from_token)
            .map(AuthCtxExtractor)
            .ok_or_else(|| AppError::Unauthorized("authentication required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::IdentityToken;
    use axum::http::Request;

    async fn extract(slot: Option<IdentitySlot>) -> Result<AuthCtx, AppError> {
        let mut req = Request::get("/").body(()).unwrap();
        if let Some(slot) = slot {
            req.extensions_mut().insert(slot);
        }
        let (mut parts, _) = req.into_parts();
        AuthCtxExtractor::from_request_parts(&mut parts, &())
            .await
            .map(|AuthCtxExtractor(ctx)| ctx)
    }

    #[tokio::test]
    async fn identity_with_caller_is_accepted() {
        let mut token = IdentityToken::for_user("U1");
        token.id = Some("T1".into());

        let ctx = extract(Some(IdentitySlot::Identity(token))).await.unwrap();
        assert_eq!(ctx.user_id, "U1");
        assert_eq!(ctx.token_id.as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn anything_else_is_unauthorized() {
        for slot in [
            None,
            Some(IdentitySlot::Unset),
            Some(IdentitySlot::Denied),
            Some(IdentitySlot::Identity(IdentityToken::default())),
        ] {
            let err = extract(slot).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }
}
