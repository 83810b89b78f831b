//! Project configuration.
//!
//! berth reads a single `berth.yml` at the project root choosing which
//! dependencies to provision:
//!
//! ```yaml
//! enable_postgres: true
//! enable_worker: true   # Redis broker for background workers
//! ```
//!
//! # Example
//!
//! ```
//! use berth::config::load_or_create;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("berth.yml"), "enable_worker: false").unwrap();
//!
//! let config = load_or_create(temp.path()).unwrap();
//! assert!(config.enable_postgres);
//! assert!(!config.enable_worker);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    config_path, load, load_or_create, parse_config, project_name, CONFIG_FILE, PROJECT_NAME_VAR,
};
pub use schema::BerthConfig;
