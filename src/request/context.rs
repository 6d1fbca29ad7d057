use std::{collections::HashMap, fmt, sync::Arc};

use axum::{
    body::{Body, Bytes},
    http::{
        Extensions, HeaderMap, HeaderName, Method, Request, Uri, Version, header,
    },
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use serde_json::{Map, Value};

use super::{IdentitySink, IdentitySlot};
use crate::error::AppError;

/// The in-flight request as seen by the handler chain.
///
/// Only `url` and `access_token` are mutated by the chain; everything else is
/// read-only input captured when the request arrived.
pub struct RequestContext {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub params: Map<String, Value>,
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
    pub signed_cookies: HashMap<String, String>,
    pub access_token: IdentitySlot,
    pub scope: Option<Arc<dyn IdentitySink>>,
    version: Version,
    raw_body: Bytes,
    extensions: Extensions,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Signed cookie values are credentials; only list their names.
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("query", &self.query.keys().collect::<Vec<_>>())
            .field("signed_cookies", &self.signed_cookies.keys().collect::<Vec<_>>())
            .field("access_token", &self.access_token)
            .field("has_scope", &self.scope.is_some())
            .finish()
    }
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let query = url
            .split_once('?')
            .map(|(_, q)| parse_pairs(q.as_bytes()))
            .unwrap_or_default();

        Self {
            method,
            url,
            headers: HeaderMap::new(),
            params: Map::new(),
            body: Map::new(),
            query,
            signed_cookies: HashMap::new(),
            access_token: IdentitySlot::Unset,
            scope: None,
            version: Version::HTTP_11,
            raw_body: Bytes::new(),
            extensions: Extensions::new(),
        }
    }

    /// Capture an axum request.
    ///
    /// - query string and urlencoded/JSON bodies become field maps
    /// - only cookies whose signature verifies against `cookie_key` are kept
    /// - an `IdentitySlot` / `Arc<dyn IdentitySink>` left in the extensions by
    ///   an earlier layer is taken over
    pub async fn from_http(
        req: Request<Body>,
        cookie_key: Option<&Key>,
        body_limit: usize,
    ) -> Result<Self, AppError> {
        let (mut parts, body) = req.into_parts();

        let raw_body = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to read request body");
                AppError::bad_request("INVALID_BODY", "request body could not be read")
            })?;

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let body = parse_body(&content_type, &raw_body)?;

        let signed_cookies = cookie_key
            .map(|key| {
                SignedCookieJar::from_headers(&parts.headers, key.clone())
                    .iter()
                    .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let mut ctx = Self::new(parts.method, url);
        ctx.access_token = parts.extensions.remove::<IdentitySlot>().unwrap_or_default();
        ctx.scope = parts.extensions.get::<Arc<dyn IdentitySink>>().cloned();
        ctx.headers = parts.headers;
        ctx.body = body;
        ctx.signed_cookies = signed_cookies;
        ctx.version = parts.version;
        ctx.raw_body = raw_body;
        ctx.extensions = parts.extensions;

        Ok(ctx)
    }

    /// Rebuild an `http::Request` for the dispatcher from the current state.
    ///
    /// The attached identity travels in the extensions as an `IdentitySlot`.
    pub fn to_http(&self) -> Result<Request<Body>, AppError> {
        let uri: Uri = self.url.parse().map_err(|err| {
            tracing::warn!(error = %err, url = %self.url, "request url is not a valid uri");
            AppError::bad_request("INVALID_URL", "request url is not valid")
        })?;

        let mut request = Request::new(Body::from(self.raw_body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers.clone();
        *request.extensions_mut() = self.extensions.clone();
        request.extensions_mut().insert(self.access_token.clone());

        Ok(request)
    }

    /// Case-insensitive header lookup (first value, decoded lossily).
    pub fn header(&self, name: &str) -> Option<String> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }
}

/// Builders for assembling contexts in tests.
#[cfg(test)]
impl RequestContext {
    /// Invalid header names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes());
        let value = axum::http::HeaderValue::from_str(value);
        if let (Ok(name), Ok(value)) = (name, value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_body_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.body.insert(name.to_string(), value.into());
        self
    }

    pub fn with_signed_cookie(mut self, name: &str, value: &str) -> Self {
        self.signed_cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_access_token(mut self, slot: IdentitySlot) -> Self {
        self.access_token = slot;
        self
    }

    pub fn with_scope(mut self, scope: Arc<dyn IdentitySink>) -> Self {
        self.scope = Some(scope);
        self
    }
}

fn parse_body(content_type: &str, raw: &Bytes) -> Result<Map<String, Value>, AppError> {
    if raw.is_empty() {
        return Ok(Map::new());
    }

    match content_type {
        "application/json" => match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(err) => {
                tracing::debug!(error = %err, "malformed json body");
                Err(AppError::bad_request("INVALID_JSON", "malformed json body"))
            }
        },
        "application/x-www-form-urlencoded" => Ok(parse_pairs(raw)),
        _ => Ok(Map::new()),
    }
}

/// urlencoded pairs → field map. A repeated key collects into an array.
fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use axum_extra::extract::cookie::Cookie;
    use serde_json::json;

    #[test]
    fn query_is_parsed_from_url() {
        let ctx = RequestContext::new(Method::GET, "/api/v1/users?access_token=abc&a=1&a=2");

        assert_eq!(ctx.query.get("access_token"), Some(&json!("abc")));
        assert_eq!(ctx.query.get("a"), Some(&json!(["1", "2"])));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let ctx = RequestContext::new(Method::GET, "/").with_header("x-access-token", "abc");
        assert_eq!(ctx.header("X-Access-Token").as_deref(), Some("abc"));
        assert_eq!(ctx.header("authorization"), None);
    }

    #[test]
    fn with_header_accepts_mixed_case_and_skips_invalid_names() {
        let ctx = RequestContext::new(Method::GET, "/")
            .with_header("X-Foo-Auth", "abc")
            .with_header("bad header", "ignored");

        assert_eq!(ctx.header("x-foo-auth").as_deref(), Some("abc"));
        assert_eq!(ctx.headers.len(), 1);
    }

    #[tokio::test]
    async fn from_http_reads_json_body_and_prior_identity() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/things?x=1")
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Body::from(r#"{"access_token":"abc","n":1}"#))
            .unwrap();
        req.extensions_mut().insert(IdentitySlot::Denied);

        let ctx = RequestContext::from_http(req, None, 1024).await.unwrap();

        assert_eq!(ctx.url, "/api/v1/things?x=1");
        assert_eq!(ctx.body.get("access_token"), Some(&json!("abc")));
        assert_eq!(ctx.query.get("x"), Some(&json!("1")));
        assert_eq!(ctx.access_token, IdentitySlot::Denied);
    }

    #[tokio::test]
    async fn from_http_rejects_malformed_json() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{nope"))
            .unwrap();

        let err = RequestContext::from_http(req, None, 1024).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "INVALID_JSON", .. }));
    }

    fn signed_cookie_pair(key: &Key, name: &'static str, value: &'static str) -> String {
        let res = SignedCookieJar::new(key.clone())
            .add(Cookie::new(name, value))
            .into_response();
        let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn only_verified_cookies_are_kept() {
        let key = Key::from(&[7u8; 64][..]);
        let signed = signed_cookie_pair(&key, "access_token", "abc");

        let req = Request::builder()
            .uri("/")
            .header(
                header::COOKIE,
                format!("{signed}; authorization=unsigned"),
            )
            .body(Body::empty())
            .unwrap();

        let ctx = RequestContext::from_http(req, Some(&key), 1024).await.unwrap();

        assert_eq!(
            ctx.signed_cookies.get("access_token").map(String::as_str),
            Some("abc")
        );
        assert!(!ctx.signed_cookies.contains_key("authorization"));
    }

    #[test]
    fn to_http_carries_rewritten_url_and_identity() {
        let mut ctx = RequestContext::new(Method::GET, "/me/orders");
        ctx.url = "/U1/orders".to_string();
        ctx.access_token = IdentitySlot::Denied;

        let req = ctx.to_http().unwrap();

        assert_eq!(req.uri().path(), "/U1/orders");
        assert_eq!(req.extensions().get::<IdentitySlot>(), Some(&IdentitySlot::Denied));
    }
}
