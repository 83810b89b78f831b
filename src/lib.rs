//! berth - Local backing services for web apps, configured for any host.
//!
//! berth runs a project's Postgres and Redis in Docker during development
//! and writes the matching connection settings into the web framework. On a
//! hosting platform it reads the platform's connection variables instead.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - `berth.yml` loading
//! - [`environment`] - Platform detection and connection environments
//! - [`error`] - Error types and result aliases
//! - [`framework`] - Framework settings handlers (Django)
//! - [`runtime`] - Container engine abstraction
//! - [`service`] - Managed service lifecycle and readiness probes
//! - [`settings`] - Framework settings maps and patches
//! - [`shell`] - External program execution
//! - [`state`] - Project state directory and service registry
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use berth::environment::{resolve_with_env, ConnectionEnvironment, Dependency, Platform};
//!
//! let env_fn = |key: &str| match key {
//!     "DATABASE_URL" => Ok("postgres://app:pw@db.internal:5432/shop".to_string()),
//!     _ => Err(std::env::VarError::NotPresent),
//! };
//! let resolved = resolve_with_env(Dependency::Postgres, Platform::Render, &env_fn).unwrap();
//! match resolved {
//!     ConnectionEnvironment::Postgres(pg) => assert_eq!(pg.host, "db.internal"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod framework;
pub mod runtime;
pub mod service;
pub mod settings;
pub mod shell;
pub mod state;
pub mod ui;

pub use error::{BerthError, Result};
