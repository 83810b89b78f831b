//! Configure command implementation.
//!
//! The `berth configure` command loads a framework settings file, starts
//! local services when running locally, and writes the resolved connection
//! settings back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::ConfigureArgs;
use crate::config::{load, load_or_create};
use crate::environment::system_env;
use crate::error::Result;
use crate::framework::{Django, FrameworkHandler};
use crate::runtime::ContainerRuntime;
use crate::settings::FrameworkSettings;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display;
use super::services::ServiceOptions;
use super::SharedEnv;

/// The configure command implementation.
pub struct ConfigureCommand {
    project_root: PathBuf,
    args: ConfigureArgs,
    runtime: Arc<dyn ContainerRuntime>,
    options: ServiceOptions,
    env_fn: Arc<SharedEnv>,
}

impl ConfigureCommand {
    /// Create a new configure command.
    pub fn new(
        project_root: &Path,
        args: ConfigureArgs,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
            runtime,
            options: ServiceOptions::new(),
            env_fn: Arc::new(system_env),
        }
    }

    /// Override probes and polling.
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    /// Read environment variables through `env_fn` instead of the process.
    pub fn with_env<F>(mut self, env_fn: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError> + Send + Sync + 'static,
    {
        self.env_fn = Arc::new(env_fn);
        self
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ConfigureArgs {
        &self.args
    }

    fn settings_path(&self) -> PathBuf {
        if self.args.settings.is_absolute() {
            self.args.settings.clone()
        } else {
            self.project_root.join(&self.args.settings)
        }
    }
}

impl Command for ConfigureCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings_path = self.settings_path();
        if !settings_path.exists() {
            ui.error(&format!(
                "Settings file not found: {}",
                settings_path.display()
            ));
            return Ok(CommandResult::failure(2));
        }

        let mut settings = FrameworkSettings::load(&settings_path)?;
        let config = load(&self.project_root)?;

        let env_fn = Arc::clone(&self.env_fn);
        let handler = self.options.configure_handler(
            FrameworkHandler::new(
                Box::new(Django),
                config,
                &self.project_root,
                Arc::clone(&self.runtime),
            )
            .with_env(move |key| env_fn(key)),
        );

        // Deploy checkouts stay untouched; only local runs seed berth.yml.
        let (_, is_remote) = handler.detect(&settings);
        if !is_remote {
            load_or_create(&self.project_root)?;
        }

        let report = handler.run(&mut settings)?;

        for warning in &report.warnings {
            ui.warning(&warning.to_string());
        }
        display::show_started(ui, &report.started);

        let target = if report.is_remote {
            report.platform.identifier()
        } else {
            "local development"
        };

        if self.args.dry_run {
            let json = serde_json::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to render settings: {}", e))?;
            ui.message(&json);
            ui.success(&format!(
                "Dry run: {} not written ({})",
                settings_path.display(),
                target
            ));
        } else {
            settings.save(&settings_path)?;
            ui.success(&format!(
                "Configured {} for {}",
                settings_path.display(),
                target
            ));
        }

        Ok(CommandResult::success())
    }
}
