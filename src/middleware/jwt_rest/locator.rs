//! Credential search across params, headers and signed cookies.
//!
//! Search order (first string wins, later sources are not consulted):
//! 1. params: route params, then body, then query, per name
//! 2. headers: `Bearer` / `Basic` values are unwrapped
//! 3. signed cookies (unsigned cookies are never looked at)

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;

use super::AuthOptions;
use crate::request::RequestContext;

pub const DEFAULT_PARAMS: &[&str] = &["access_token"];
pub const DEFAULT_HEADERS: &[&str] = &["X-Access-Token", "authorization"];
pub const DEFAULT_COOKIES: &[&str] = &["access_token", "authorization"];

// Padding optional, stray bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Find the raw credential of a request, or `None`.
pub fn token_for_request(req: &RequestContext, options: &AuthOptions) -> Option<String> {
    let defaults = options.search_default_token_keys;

    for name in search_keys(&options.params, DEFAULT_PARAMS, defaults) {
        // The first source holding the name decides; a non-string there skips the name.
        let value = req
            .params
            .get(name)
            .or_else(|| req.body.get(name))
            .or_else(|| req.query.get(name));

        if let Some(Value::String(id)) = value {
            tracing::debug!(source = "param", name, "access token located");
            return Some(id.clone());
        }
    }

    for name in search_keys(&options.headers, DEFAULT_HEADERS, defaults) {
        if let Some(value) = req.header(name) {
            tracing::debug!(source = "header", name, "access token located");
            return Some(unwrap_authorization(&value));
        }
    }

    for name in search_keys(&options.cookies, DEFAULT_COOKIES, defaults) {
        if let Some(value) = req.signed_cookies.get(name) {
            tracing::debug!(source = "cookie", name, "access token located");
            return Some(value.clone());
        }
    }

    None
}

fn search_keys<'a>(
    custom: &'a [String],
    builtin: &'static [&'static str],
    include_builtin: bool,
) -> impl Iterator<Item = &'a str> {
    let builtin: &'static [&'static str] = if include_builtin { builtin } else { &[] };
    custom.iter().map(String::as_str).chain(builtin.iter().copied())
}

/// Unwrap `Bearer <base64>` and `Basic <base64>` header values.
///
/// For Basic, `user:pass` yields the longer half (left half on a tie); a value
/// without a colon is returned whole. Anything else is returned untouched.
pub fn unwrap_authorization(value: &str) -> String {
    if let Some(encoded) = value.strip_prefix("Bearer ") {
        return decode_base64_text(encoded);
    }

    let is_basic = value
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("basic "));
    if is_basic {
        let decoded = decode_base64_text(&value[6..]);
        // NOTE: picking the longer half is a heuristic, not part of RFC 7617.
        // Lengths are counted in chars (not UTF-16 units), and a newline after
        // the colon still splits (`user:pa\nss` yields `pa\nss`).
        return match decoded.split_once(':') {
            Some((user, pass)) if pass.chars().count() > user.chars().count() => pass.to_string(),
            Some((user, _)) => user.to_string(),
            None => decoded,
        };
    }

    value.to_string()
}

/// Lenient base64 → UTF-8 text.
///
/// Accepts the standard and URL-safe alphabets, stops at the first `=`, skips
/// characters outside the alphabet and replaces invalid UTF-8. Never fails.
fn decode_base64_text(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .take_while(|c| *c != '=')
        .filter_map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            '-' => Some('+'),
            '_' => Some('/'),
            _ => None,
        })
        .collect();

    // A lone trailing sextet carries no full byte.
    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    let bytes = LENIENT.decode(cleaned.as_bytes()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::json;

    fn request() -> RequestContext {
        RequestContext::new(Method::GET, "/")
    }

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    fn options() -> AuthOptions {
        AuthOptions::default()
    }

    #[test]
    fn custom_param_precedes_default() {
        let options = AuthOptions {
            params: vec!["foo_auth".into()],
            ..options()
        };
        let req = request()
            .with_param("access_token", "builtin")
            .with_body_field("foo_auth", "custom");

        assert_eq!(token_for_request(&req, &options).as_deref(), Some("custom"));
    }

    #[test]
    fn route_params_then_body_then_query() {
        let req = RequestContext::new(Method::GET, "/?access_token=from-query")
            .with_body_field("access_token", "from-body");
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("from-body"));

        let req = req.with_param("access_token", "from-route");
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("from-route"));

        let req = RequestContext::new(Method::GET, "/?access_token=from-query");
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("from-query"));
    }

    #[test]
    fn non_string_value_skips_the_name() {
        let options = AuthOptions {
            params: vec!["custom".into()],
            ..options()
        };
        // body wins the lookup for `custom` but is not a string; query is not consulted.
        let req = RequestContext::new(Method::GET, "/?custom=from-query&access_token=fallback")
            .with_body_field("custom", json!(123));

        assert_eq!(token_for_request(&req, &options).as_deref(), Some("fallback"));
    }

    #[test]
    fn repeated_query_key_is_not_a_string() {
        let req = RequestContext::new(Method::GET, "/?access_token=a&access_token=b");
        assert_eq!(token_for_request(&req, &options()), None);
    }

    #[test]
    fn params_precede_headers_and_cookies() {
        let req = request()
            .with_param("access_token", "from-param")
            .with_header("x-access-token", "from-header")
            .with_signed_cookie("access_token", "from-cookie");

        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("from-param"));
    }

    #[test]
    fn bearer_is_base64_decoded() {
        let req = request().with_header("authorization", &format!("Bearer {}", b64("abc123")));
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("abc123"));
    }

    #[test]
    fn bearer_prefix_is_case_sensitive() {
        let value = format!("bearer {}", b64("abc123"));
        assert_eq!(unwrap_authorization(&value), value);
    }

    #[test]
    fn bearer_accepts_url_safe_without_padding() {
        let value = format!("Bearer {}", URL_SAFE_NO_PAD.encode("a?b>c~"));
        assert_eq!(unwrap_authorization(&value), "a?b>c~");
    }

    #[test]
    fn basic_without_colon_is_returned_whole() {
        let value = format!("Basic {}", b64("a2b2c3"));
        assert_eq!(unwrap_authorization(&value), "a2b2c3");
    }

    #[test]
    fn basic_picks_longer_half() {
        assert_eq!(
            unwrap_authorization(&format!("Basic {}", b64("token:a2b2c3"))),
            "a2b2c3"
        );
        assert_eq!(
            unwrap_authorization(&format!("Basic {}", b64(":a2b2c3"))),
            "a2b2c3"
        );
    }

    #[test]
    fn basic_tie_or_longer_left_keeps_left() {
        assert_eq!(
            unwrap_authorization(&format!("Basic {}", b64("a2b2c3:"))),
            "a2b2c3"
        );
        assert_eq!(unwrap_authorization(&format!("Basic {}", b64("abc:xyz"))), "abc");
        assert_eq!(unwrap_authorization(&format!("Basic {}", b64(":"))), "");
    }

    #[test]
    fn basic_lengths_count_chars_and_newlines_split() {
        // 2 chars against 3 chars, although "üü" is 4 bytes.
        assert_eq!(unwrap_authorization(&format!("Basic {}", b64("üü:abc"))), "abc");
        assert_eq!(
            unwrap_authorization(&format!("Basic {}", b64("user:pa\nss"))),
            "pa\nss"
        );
    }

    #[test]
    fn basic_prefix_ignores_case() {
        let value = format!("bAsIc {}", b64("token:a2b2c3"));
        assert_eq!(unwrap_authorization(&value), "a2b2c3");
    }

    #[test]
    fn other_header_values_pass_through() {
        let req = request().with_header("authorization", "eyJ0eXAi.payload.sig");
        assert_eq!(
            token_for_request(&req, &options()).as_deref(),
            Some("eyJ0eXAi.payload.sig")
        );
    }

    #[test]
    fn custom_header_precedes_defaults() {
        let options = AuthOptions {
            headers: vec!["X-Foo-Auth".into()],
            ..options()
        };
        let req = request()
            .with_header("authorization", "builtin")
            .with_header("x-foo-auth", "custom");

        assert_eq!(token_for_request(&req, &options).as_deref(), Some("custom"));
    }

    #[test]
    fn x_access_token_precedes_authorization() {
        let req = request()
            .with_header("authorization", "second")
            .with_header("x-access-token", "first");
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("first"));
    }

    #[test]
    fn signed_cookies_are_searched_last() {
        let req = request().with_signed_cookie("authorization", "from-cookie");
        assert_eq!(token_for_request(&req, &options()).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn unsigned_cookie_header_is_ignored() {
        let req = request().with_header("cookie", "access_token=unsigned");
        assert_eq!(token_for_request(&req, &options()), None);
    }

    #[test]
    fn defaults_can_be_switched_off() {
        let options = AuthOptions {
            search_default_token_keys: false,
            cookies: vec!["foo-auth".into()],
            ..options()
        };
        let req = request()
            .with_param("access_token", "ignored")
            .with_header("authorization", "ignored")
            .with_signed_cookie("foo-auth", "custom");

        assert_eq!(token_for_request(&req, &options).as_deref(), Some("custom"));

        let req = request().with_param("access_token", "ignored");
        assert_eq!(token_for_request(&req, &options), None);
    }

    #[test]
    fn nothing_found() {
        assert_eq!(token_for_request(&request(), &options()), None);
    }

    #[test]
    fn lenient_base64_skips_noise_and_stops_at_padding() {
        assert_eq!(decode_base64_text("YWJj\nMTIz"), "abc123");
        assert_eq!(decode_base64_text("YWI=garbage"), "ab");
        assert_eq!(decode_base64_text("YWJjM"), "abc");
        assert_eq!(decode_base64_text(""), "");
    }
}
