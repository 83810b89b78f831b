//! External program execution.

pub mod command;

pub use command::{display_command, run, run_interactive, CommandOptions, CommandResult};
