//! Local connection defaults.
//!
//! These values are read both by the local resolvers and by the managed
//! container specs, so a locally started service always matches the
//! environment handed to the application.

/// PostgreSQL defaults.
pub mod postgres {
    pub const IMAGE: &str = "postgres:12";
    pub const CONTAINER_NAME: &str = "berth_postgres";
    pub const CONTAINER_PORT: u16 = 5432;

    pub const HOST: &str = "localhost";
    pub const PORT: u16 = 5432;
    pub const USER: &str = "postgres";
    pub const PASSWORD: &str = "postgres";
    pub const DB: &str = "postgres";

    /// Data directory inside the container.
    pub const DATA_DIR: &str = "/var/lib/postgresql/data";
}

/// Redis defaults.
pub mod redis {
    pub const IMAGE: &str = "redis:7.2.4";
    pub const CONTAINER_NAME: &str = "berth_redis";
    pub const CONTAINER_PORT: u16 = 6379;

    pub const HOST: &str = "localhost";
    pub const PORT: u16 = 6379;
    pub const DB: u32 = 0;
}
