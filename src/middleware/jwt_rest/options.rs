use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Literal used when `currentUserLiteral` is enabled without a usable string.
pub const DEFAULT_CURRENT_USER_LITERAL: &str = "me";

/// Path segment standing for "the caller", e.g. `/users/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CurrentUserLiteral {
    #[default]
    Disabled,
    Literal(String),
}

impl CurrentUserLiteral {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// The literal to rewrite, if there is a non-empty one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Literal(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for CurrentUserLiteral {
    // string → itself; falsy → disabled; any other truthy value → "me"
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Literal(s),
            Value::Null | Value::Bool(false) => Self::Disabled,
            Value::Number(n) if n.as_f64() == Some(0.0) => Self::Disabled,
            other => {
                tracing::debug!(
                    value = %other,
                    "currentUserLiteral is not a string, using '{}'",
                    DEFAULT_CURRENT_USER_LITERAL
                );
                Self::Literal(DEFAULT_CURRENT_USER_LITERAL.to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for CurrentUserLiteral {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(de).map(Self::from)
    }
}

/// Options of the token step.
///
/// Deserializes from camelCase keys; anything missing falls back to
/// [`AuthOptions::default`].
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthOptions {
    /// Key material used to verify token signatures.
    pub secret: Option<String>,
    /// Extra signed-cookie names, searched before the built-in ones.
    pub cookies: Vec<String>,
    /// Extra header names, searched before the built-in ones.
    pub headers: Vec<String>,
    /// Extra param names, searched before the built-in ones.
    pub params: Vec<String>,
    /// Append the built-in names (`access_token`, `X-Access-Token`, `authorization`).
    pub search_default_token_keys: bool,
    /// Search again even if an earlier step already populated the identity.
    pub enable_doublecheck: bool,
    /// Together with `enable_doublecheck`, replace an identity that has a caller.
    pub overwrite_existing_token: bool,
    pub current_user_literal: CurrentUserLiteral,
    /// Token model name. Carried for the embedding application only.
    pub model: Option<String>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            secret: None,
            cookies: Vec::new(),
            headers: Vec::new(),
            params: Vec::new(),
            search_default_token_keys: true,
            enable_doublecheck: false,
            overwrite_existing_token: false,
            current_user_literal: CurrentUserLiteral::Disabled,
            model: None,
        }
    }
}

impl AuthOptions {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthOptions")
            .field("has_secret", &self.secret.is_some())
            .field("cookies", &self.cookies)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("search_default_token_keys", &self.search_default_token_keys)
            .field("enable_doublecheck", &self.enable_doublecheck)
            .field("overwrite_existing_token", &self.overwrite_existing_token)
            .field("current_user_literal", &self.current_user_literal)
            .field("model", &self.model)
            .finish()
    }
}
