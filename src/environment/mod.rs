//! Platform detection and connection environment resolution.
//!
//! The platform is read from `BERTH_PLATFORM`. Each dependency then has a
//! resolver per supported platform:
//!
//! 1. Local: fixed defaults shared with the managed container specs
//! 2. Render: a single connection string (`DATABASE_URL`, `REDIS_URL`)
//! 3. Unknown remote: one variable per field, falling back to defaults
//!
//! # Example
//!
//! ```
//! use berth::environment::{resolve_postgres_with_env, Platform};
//!
//! let env = |_: &str| Err(std::env::VarError::NotPresent);
//! let pg = resolve_postgres_with_env(Platform::Local, &env).unwrap();
//! assert_eq!(pg.port, 5432);
//! assert_eq!(pg.user, "postgres");
//! ```

pub mod connection_url;
pub mod defaults;
pub mod detection;
pub mod postgres;
pub mod redis;
pub mod resolver;

pub use connection_url::ConnectionUrl;
pub use detection::{system_env, EnvLookup, Platform, PLATFORM_VAR};
pub use postgres::PostgresEnvironment;
pub use redis::RedisEnvironment;
pub use resolver::{
    resolve, resolve_postgres_with_env, resolve_redis_with_env, resolve_with_env,
    ConnectionEnvironment, Dependency,
};
