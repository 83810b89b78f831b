//! Stop command implementation.
//!
//! The `berth stop` command stops every container recorded in the service
//! registry and clears it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::StopArgs;
use crate::error::Result;
use crate::runtime::ContainerRuntime;
use crate::state::{ServiceRegistry, StateDir};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::short_id;

/// The stop command implementation.
pub struct StopCommand {
    project_root: PathBuf,
    args: StopArgs,
    runtime: Arc<dyn ContainerRuntime>,
}

impl StopCommand {
    /// Create a new stop command.
    pub fn new(project_root: &Path, args: StopArgs, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
            runtime,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &StopArgs {
        &self.args
    }
}

impl Command for StopCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = ServiceRegistry::new(StateDir::at(&self.project_root).registry_file());
        let entries = registry.entries()?;
        if entries.is_empty() {
            ui.message("No berth services are running");
            return Ok(CommandResult::success());
        }

        let mut spinner = ui.start_spinner(&format!("Stopping {} container(s)", entries.len()));
        let report = match registry.drain(self.runtime.as_ref()) {
            Ok(report) => report,
            Err(e) => {
                spinner.finish_error("Could not reach the container runtime");
                return Err(e);
            }
        };

        if report.failed.is_empty() {
            spinner.finish_success(&format!("Stopped {} container(s)", report.stopped.len()));
        } else {
            spinner.finish_error(&format!(
                "Stopped {} of {} container(s)",
                report.stopped.len(),
                report.total()
            ));
        }

        if !report.not_found.is_empty() {
            ui.message(&format!(
                "{} container(s) were already removed",
                report.not_found.len()
            ));
        }
        for (id, reason) in &report.failed {
            ui.warning(&format!("Could not stop {}: {}", short_id(id), reason));
        }

        if report.failed.is_empty() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
