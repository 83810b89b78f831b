//! Connection environment resolution.
//!
//! Every supported (dependency, platform) pair has exactly one entry in
//! [`RESOLVERS`]. Pairs without an entry fail with
//! [`BerthError::UnsupportedPlatform`].

use serde::Serialize;
use std::fmt;

use super::detection::{system_env, EnvLookup, Platform};
use super::postgres::PostgresEnvironment;
use super::redis::RedisEnvironment;
use crate::error::{BerthError, Result};

/// An external service the application depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    Postgres,
    Redis,
}

impl Dependency {
    /// Every dependency, in configuration order.
    pub const ALL: [Dependency; 2] = [Dependency::Postgres, Dependency::Redis];

    pub fn name(&self) -> &'static str {
        match self {
            Dependency::Postgres => "postgres",
            Dependency::Redis => "redis",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved connection environment for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "dependency", rename_all = "snake_case")]
pub enum ConnectionEnvironment {
    Postgres(PostgresEnvironment),
    Redis(RedisEnvironment),
}

impl ConnectionEnvironment {
    pub fn dependency(&self) -> Dependency {
        match self {
            ConnectionEnvironment::Postgres(_) => Dependency::Postgres,
            ConnectionEnvironment::Redis(_) => Dependency::Redis,
        }
    }
}

type ResolveFn = fn(&EnvLookup) -> Result<ConnectionEnvironment>;

/// The dispatch table of supported combinations.
const RESOLVERS: &[(Dependency, Platform, ResolveFn)] = &[
    (Dependency::Postgres, Platform::Local, |_| {
        Ok(ConnectionEnvironment::Postgres(PostgresEnvironment::local()))
    }),
    (Dependency::Postgres, Platform::Render, |env_fn| {
        PostgresEnvironment::from_url_env(env_fn).map(ConnectionEnvironment::Postgres)
    }),
    (Dependency::Postgres, Platform::UnknownRemote, |env_fn| {
        Ok(ConnectionEnvironment::Postgres(PostgresEnvironment::from_env(env_fn)))
    }),
    (Dependency::Redis, Platform::Local, |_| {
        Ok(ConnectionEnvironment::Redis(RedisEnvironment::local()))
    }),
    (Dependency::Redis, Platform::Render, |env_fn| {
        RedisEnvironment::from_url_env(env_fn).map(ConnectionEnvironment::Redis)
    }),
    (Dependency::Redis, Platform::UnknownRemote, |env_fn| {
        Ok(ConnectionEnvironment::Redis(RedisEnvironment::from_env(env_fn)))
    }),
];

/// Whether a resolver exists for this pair.
pub fn is_supported(dependency: Dependency, platform: Platform) -> bool {
    RESOLVERS
        .iter()
        .any(|(d, p, _)| *d == dependency && *p == platform)
}

/// Resolve against the real process environment.
pub fn resolve(dependency: Dependency, platform: Platform) -> Result<ConnectionEnvironment> {
    resolve_with_env(dependency, platform, &system_env)
}

/// Resolve with a custom env var lookup (for testing).
pub fn resolve_with_env(
    dependency: Dependency,
    platform: Platform,
    env_fn: &EnvLookup,
) -> Result<ConnectionEnvironment> {
    let (_, _, resolver) = RESOLVERS
        .iter()
        .find(|(d, p, _)| *d == dependency && *p == platform)
        .ok_or(BerthError::UnsupportedPlatform {
            platform,
            dependency,
        })?;
    tracing::debug!("Resolving {} environment for {}", dependency, platform);
    resolver(env_fn)
}

/// Resolve the Postgres environment for a platform.
pub fn resolve_postgres_with_env(
    platform: Platform,
    env_fn: &EnvLookup,
) -> Result<PostgresEnvironment> {
    match resolve_with_env(Dependency::Postgres, platform, env_fn)? {
        ConnectionEnvironment::Postgres(env) => Ok(env),
        other => Err(anyhow::anyhow!("postgres resolver produced {:?}", other.dependency()).into()),
    }
}

/// Resolve the Redis environment for a platform.
pub fn resolve_redis_with_env(platform: Platform, env_fn: &EnvLookup) -> Result<RedisEnvironment> {
    match resolve_with_env(Dependency::Redis, platform, env_fn)? {
        ConnectionEnvironment::Redis(env) => Ok(env),
        other => Err(anyhow::anyhow!("redis resolver produced {:?}", other.dependency()).into()),
    }
}
