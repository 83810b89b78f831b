//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::{Cli, Commands, UpArgs};
use crate::error::Result;
use crate::runtime::{ContainerRuntime, DockerCli};
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result mirroring a child process exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    runtime: Arc<dyn ContainerRuntime>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root, driving Docker.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            runtime: Arc::new(DockerCli::new()),
        }
    }

    /// Use another container runtime.
    pub fn with_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let runtime = Arc::clone(&self.runtime);
        match &cli.command {
            Some(Commands::Up(args)) => {
                let cmd = super::up::UpCommand::new(&self.project_root, args.clone(), runtime);
                cmd.execute(ui)
            }
            Some(Commands::Configure(args)) => {
                let cmd = super::configure::ConfigureCommand::new(
                    &self.project_root,
                    args.clone(),
                    runtime,
                );
                cmd.execute(ui)
            }
            Some(Commands::Env(args)) => {
                let cmd = super::env::EnvCommand::new(&self.project_root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Stop(args)) => {
                let cmd = super::stop::StopCommand::new(&self.project_root, args.clone(), runtime);
                cmd.execute(ui)
            }
            Some(Commands::Shell(args)) => {
                let cmd = super::shell::ShellCommand::new(&self.project_root, args.clone(), runtime);
                cmd.execute(ui)
            }
            None => {
                // Default to bringing services up
                let cmd = super::up::UpCommand::new(&self.project_root, UpArgs::default(), runtime);
                cmd.execute(ui)
            }
        }
    }
}
