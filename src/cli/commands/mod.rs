//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`berth up`, `berth stop`)
//! - One container runtime shared by every command
//! - Consistent global flag handling

pub mod configure;
pub mod dispatcher;
pub mod display;
pub mod env;
pub mod services;
pub mod shell;
pub mod stop;
pub mod up;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use services::ServiceOptions;

/// Environment lookup that commands can hand to worker threads.
pub type SharedEnv =
    dyn Fn(&str) -> std::result::Result<String, std::env::VarError> + Send + Sync;
