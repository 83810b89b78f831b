//! Redis connection environment.

use serde::Serialize;

use super::defaults::redis as defaults;
use super::detection::EnvLookup;
use super::postgres::parse_or_default;
use super::connection_url::{encode_userinfo, ConnectionUrl};
use crate::error::{BerthError, Result};

/// Connection string variable on Render.
pub const REDIS_URL_VAR: &str = "REDIS_URL";

const SCHEMES: &[&str] = &["redis", "rediss"];
const TLS_SCHEME: &str = "rediss";

/// How to reach a Redis server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisEnvironment {
    pub host: String,
    pub port: u16,
    /// ACL user (Redis 6+). `None` authenticates as the default user.
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: u32,
    /// Connect over TLS (`rediss://`).
    pub tls: bool,
}

impl Default for RedisEnvironment {
    fn default() -> Self {
        Self::local()
    }
}

impl RedisEnvironment {
    /// The environment of the locally managed container.
    pub fn local() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            username: None,
            password: None,
            db: defaults::DB,
            tls: false,
        }
    }

    /// Parse a `redis://` connection string.
    ///
    /// A lone userinfo token (`redis://secret@host`) is the password, as is
    /// conventional for Redis; `user:password` keeps both for ACL auth. The
    /// path, when present, is the db index.
    pub fn from_url(input: &str) -> std::result::Result<Self, String> {
        let url = ConnectionUrl::parse(input)?;
        url.require_scheme(SCHEMES)?;

        let db = match url.path.as_deref() {
            Some(path) => path
                .parse::<u32>()
                .map_err(|_| format!("database '{}' is not a number", path))?,
            None => defaults::DB,
        };

        let (username, password) = match (url.user, url.password) {
            (Some(token), None) => (None, Some(token)),
            (user, password) => (user, password),
        };

        Ok(Self {
            tls: url.scheme == TLS_SCHEME,
            host: url.host,
            port: url.port.unwrap_or(defaults::PORT),
            username,
            password,
            db,
        })
    }

    /// Read [`REDIS_URL_VAR`] and parse it.
    pub fn from_url_env(env_fn: &EnvLookup) -> Result<Self> {
        let raw = env_fn(REDIS_URL_VAR).map_err(|_| BerthError::ConfigurationParse {
            variable: REDIS_URL_VAR.to_string(),
            message: "variable is not set".to_string(),
        })?;
        Self::from_url(&raw).map_err(|message| BerthError::ConfigurationParse {
            variable: REDIS_URL_VAR.to_string(),
            message,
        })
    }

    /// Read `REDIS_*` variables, substituting local defaults for any that
    /// are absent or unparseable.
    pub fn from_env(env_fn: &EnvLookup) -> Self {
        let local = Self::local();
        Self {
            host: env_fn("REDIS_HOST").unwrap_or(local.host),
            port: parse_or_default(env_fn, "REDIS_PORT", local.port),
            username: env_fn("REDIS_USERNAME").ok().filter(|u| !u.is_empty()),
            password: env_fn("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            db: parse_or_default(env_fn, "REDIS_DB", local.db),
            tls: false,
        }
    }

    /// Render as a `redis://` (or `rediss://`) URL suitable for a broker
    /// setting. Credentials are percent-encoded.
    pub fn url(&self) -> String {
        let scheme = if self.tls { TLS_SCHEME } else { "redis" };
        let user = self.username.as_deref().map(encode_userinfo);
        let userinfo = match (user, &self.password) {
            (Some(user), Some(password)) => format!("{}:{}@", user, encode_userinfo(password)),
            (Some(user), None) => format!("{}@", user),
            (None, Some(password)) => format!(":{}@", encode_userinfo(password)),
            (None, None) => String::new(),
        };
        format!(
            "{}://{}{}:{}/{}",
            scheme, userinfo, self.host, self.port, self.db
        )
    }
}
