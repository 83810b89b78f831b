//! PostgreSQL connection environment.

use serde::Serialize;

use super::defaults::postgres as defaults;
use super::detection::EnvLookup;
use super::connection_url::ConnectionUrl;
use crate::error::{BerthError, Result};

/// Connection string variable on Render.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Schemes accepted in [`DATABASE_URL_VAR`].
const SCHEMES: &[&str] = &["postgres", "postgresql"];

/// How to reach a PostgreSQL database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostgresEnvironment {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
}

impl Default for PostgresEnvironment {
    fn default() -> Self {
        Self::local()
    }
}

impl PostgresEnvironment {
    /// The environment of the locally managed container.
    pub fn local() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            user: defaults::USER.to_string(),
            password: defaults::PASSWORD.to_string(),
            db: defaults::DB.to_string(),
        }
    }

    /// Parse a `postgres://` connection string.
    ///
    /// A missing port uses 5432; missing credentials or database name use
    /// the local defaults.
    pub fn from_url(input: &str) -> std::result::Result<Self, String> {
        let url = ConnectionUrl::parse(input)?;
        url.require_scheme(SCHEMES)?;
        let local = Self::local();
        Ok(Self {
            host: url.host,
            port: url.port.unwrap_or(defaults::PORT),
            user: url.user.unwrap_or(local.user),
            password: url.password.unwrap_or(local.password),
            db: url.path.unwrap_or(local.db),
        })
    }

    /// Read [`DATABASE_URL_VAR`] and parse it.
    pub fn from_url_env(env_fn: &EnvLookup) -> Result<Self> {
        let raw = env_fn(DATABASE_URL_VAR).map_err(|_| BerthError::ConfigurationParse {
            variable: DATABASE_URL_VAR.to_string(),
            message: "variable is not set".to_string(),
        })?;
        Self::from_url(&raw).map_err(|message| BerthError::ConfigurationParse {
            variable: DATABASE_URL_VAR.to_string(),
            message,
        })
    }

    /// Read `POSTGRES_*` variables, substituting local defaults for any
    /// that are absent or unparseable.
    pub fn from_env(env_fn: &EnvLookup) -> Self {
        let local = Self::local();
        Self {
            host: env_fn("POSTGRES_HOST").unwrap_or(local.host),
            port: parse_or_default(env_fn, "POSTGRES_PORT", local.port),
            user: env_fn("POSTGRES_USER").unwrap_or(local.user),
            password: env_fn("POSTGRES_PASSWORD").unwrap_or(local.password),
            db: env_fn("POSTGRES_DB").unwrap_or(local.db),
        }
    }
}

/// Parse a numeric variable, logging and falling back when malformed.
pub(crate) fn parse_or_default<T>(env_fn: &EnvLookup, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env_fn(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring {}={:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
