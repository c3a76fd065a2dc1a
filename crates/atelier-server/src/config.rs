//! Server configuration assembled from `ATELIER_*` environment variables.

use std::env;
use std::fs;
use std::str::FromStr;

use atelier_auth::{AuthConfig, RateLimitConfig, RefreshCookie};
use atelier_authz::GuardConfig;
use atelier_core::error::AtelierError;
use atelier_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for AtelierError {
    fn from(err: ConfigError) -> Self {
        AtelierError::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub guard: GuardConfig,
    pub refresh_cookie: RefreshCookie,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults. The
    /// JWT key pair is required and read from the PEM files named by
    /// `ATELIER_JWT_PRIVATE_KEY_PATH` and `ATELIER_JWT_PUBLIC_KEY_PATH`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let db = DbConfig {
            endpoint: lookup("ATELIER_DB_ENDPOINT").unwrap_or(db_defaults.endpoint),
            namespace: lookup("ATELIER_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("ATELIER_DB_DATABASE").unwrap_or(db_defaults.database),
            root_user: lookup("ATELIER_DB_USER").unwrap_or(db_defaults.root_user),
            root_password: lookup("ATELIER_DB_PASSWORD").unwrap_or(db_defaults.root_password),
        };

        let auth_defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_private_key_pem: read_pem(&lookup, "ATELIER_JWT_PRIVATE_KEY_PATH")?,
            jwt_public_key_pem: read_pem(&lookup, "ATELIER_JWT_PUBLIC_KEY_PATH")?,
            access_token_lifetime_secs: parse_or(
                &lookup,
                "ATELIER_ACCESS_TOKEN_TTL_SECS",
                auth_defaults.access_token_lifetime_secs,
            )?,
            refresh_token_lifetime_secs: parse_or(
                &lookup,
                "ATELIER_REFRESH_TOKEN_TTL_SECS",
                auth_defaults.refresh_token_lifetime_secs,
            )?,
            jwt_issuer: lookup("ATELIER_JWT_ISSUER").unwrap_or(auth_defaults.jwt_issuer),
            pepper: lookup("ATELIER_PASSWORD_PEPPER").filter(|p| !p.is_empty()),
        };

        let limit_defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&lookup, "ATELIER_RATE_LIMIT_MAX", limit_defaults.max_requests)?,
            window_secs: parse_or(
                &lookup,
                "ATELIER_RATE_LIMIT_WINDOW_SECS",
                limit_defaults.window_secs,
            )?,
        };

        let guard = GuardConfig {
            deny_unannotated: parse_or(&lookup, "ATELIER_DENY_UNANNOTATED", false)?,
        };

        let refresh_cookie = RefreshCookie {
            domain: lookup("ATELIER_COOKIE_DOMAIN"),
            ..RefreshCookie::default()
        };

        Ok(Self {
            db,
            auth,
            rate_limit,
            guard,
            refresh_cookie,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn read_pem(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    let path = lookup(key).ok_or(ConfigError::Missing(key))?;
    fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })
}
