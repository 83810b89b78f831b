//! Up command implementation.
//!
//! The `berth up` command starts every enabled service container and waits
//! until each one accepts connections.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::UpArgs;
use crate::config::{load_or_create, project_name};
use crate::environment::system_env;
use crate::error::Result;
use crate::framework::{Django, FrameworkHandler};
use crate::runtime::ContainerRuntime;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display;
use super::services::ServiceOptions;

/// The up command implementation.
pub struct UpCommand {
    project_root: PathBuf,
    args: UpArgs,
    runtime: Arc<dyn ContainerRuntime>,
    options: ServiceOptions,
}

impl UpCommand {
    /// Create a new up command.
    pub fn new(project_root: &Path, args: UpArgs, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
            runtime,
            options: ServiceOptions::new(),
        }
    }

    /// Override probes and polling.
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &UpArgs {
        &self.args
    }
}

impl Command for UpCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = load_or_create(&self.project_root)?;
        ui.show_header(&project_name(&self.project_root, &system_env));

        let dependencies = config.dependencies();
        if dependencies.is_empty() {
            ui.message("No services are enabled in berth.yml");
            return Ok(CommandResult::success());
        }

        let names: Vec<&str> = dependencies.iter().map(|d| d.name()).collect();
        let mut spinner = ui.start_spinner(&format!("Starting {}", names.join(", ")));

        let handler = self.options.configure_handler(FrameworkHandler::new(
            Box::new(Django),
            config,
            &self.project_root,
            Arc::clone(&self.runtime),
        ));

        match handler.start_services() {
            Ok(started) => {
                spinner.finish_success("Services ready");
                display::show_started(ui, &started);
                Ok(CommandResult::success())
            }
            Err(e) => {
                spinner.finish_error("Services failed to start");
                Err(e)
            }
        }
    }
}
