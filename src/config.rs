/*
 * Responsibility
 * - Read settings from the environment (.env supported)
 * - Validate them (missing / malformed values fail startup)
 * - Hand out the token options, remoting settings and cookie key
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use serde_json::Value;

use crate::middleware::jwt_rest::{AuthOptions, CurrentUserLiteral};
use crate::rest::RemotingSettings;
use crate::state::DEFAULT_BODY_LIMIT;

/// Signed-cookie keys shorter than this are rejected.
const MIN_COOKIE_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_enabled: bool,
    pub auth: AuthOptions,
    pub remoting: RemotingSettings,

    // Signs/verifies cookies; without it no cookie is trusted.
    pub cookie_secret: Option<String>,

    pub body_limit: usize,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("auth_enabled", &self.auth_enabled)
            .field("auth", &self.auth)
            .field("remoting", &self.remoting)
            .field("has_cookie_secret", &self.cookie_secret.is_some())
            .field("body_limit", &self.body_limit)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let cookie_secret = lookup("COOKIE_SECRET").filter(|s| !s.is_empty());
        if cookie_secret
            .as_ref()
            .is_some_and(|s| s.len() < MIN_COOKIE_SECRET_LEN)
        {
            return Err(ConfigError::Invalid("COOKIE_SECRET"));
        }

        let auth = AuthOptions {
            secret: Some(secret),
            cookies: list(lookup("TOKEN_COOKIES")),
            headers: list(lookup("TOKEN_HEADERS")),
            params: list(lookup("TOKEN_PARAMS")),
            search_default_token_keys: flag(&lookup, "SEARCH_DEFAULT_TOKEN_KEYS", true)?,
            enable_doublecheck: flag(&lookup, "ENABLE_DOUBLECHECK", false)?,
            overwrite_existing_token: flag(&lookup, "OVERWRITE_EXISTING_TOKEN", false)?,
            current_user_literal: lookup("CURRENT_USER_LITERAL")
                .map(CurrentUserLiteral::Literal)
                .unwrap_or_default(),
            model: lookup("TOKEN_MODEL").filter(|s| !s.is_empty()),
        };

        // Raw JSON when it parses (`false`, `{..}`), a plain string otherwise.
        let remoting = RemotingSettings {
            context: lookup("REMOTING_CONTEXT")
                .map(|v| serde_json::from_str(&v).unwrap_or(Value::String(v))),
        };

        let body_limit = match lookup("BODY_LIMIT_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("BODY_LIMIT_BYTES"))?,
            None => DEFAULT_BODY_LIMIT,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECONDS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            ),
            None => Duration::from_secs(30),
        };

        Ok(Self {
            addr,
            app_env,
            auth_enabled: flag(&lookup, "AUTH_ENABLED", true)?,
            auth,
            remoting,
            cookie_secret,
            body_limit,
            request_timeout,
        })
    }

    pub fn cookie_key(&self) -> Result<Option<Key>, ConfigError> {
        self.cookie_secret
            .as_deref()
            .map(|secret| {
                Key::try_from(secret.as_bytes()).map_err(|_| ConfigError::Invalid("COOKIE_SECRET"))
            })
            .transpose()
    }
}

fn list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}
