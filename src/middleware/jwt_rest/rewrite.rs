use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::{Captures, Regex};

use crate::request::RequestContext;

// Bytes a caller id may not carry verbatim inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Rewrites `/<literal>` path segments into `/<caller id>`.
///
/// A segment matches when followed by `/`, `?` or the end of the url. The
/// literal is escaped, so `a.b` only ever matches `a.b`.
#[derive(Debug, Clone)]
pub struct UserLiteralRewriter {
    literal: String,
    pattern: Regex,
}

impl UserLiteralRewriter {
    pub fn new(literal: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("/{}(/|$|\\?)", regex::escape(literal)))?;
        Ok(Self {
            literal: literal.to_string(),
            pattern,
        })
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Replace the literal with the attached caller id, everywhere in the url.
    ///
    /// No-op without an attached caller id. Running it twice changes nothing.
    /// The id is percent-encoded as one path segment.
    pub fn rewrite(&self, req: &mut RequestContext) {
        let Some(user_id) = req.access_token.caller_id() else {
            return;
        };
        let user_id = utf8_percent_encode(user_id, SEGMENT).to_string();

        let rewritten = self
            .pattern
            .replace_all(&req.url, |caps: &Captures<'_>| format!("/{}{}", user_id, &caps[1]));

        if let Cow::Owned(url) = rewritten {
            tracing::debug!(from = %req.url, to = %url, "req.url has been rewritten");
            req.url = url;
        }
    }
}
