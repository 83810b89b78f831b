//! Shell command implementation.
//!
//! The `berth shell` command makes sure a service container is ready, then
//! attaches `psql` or `redis-cli` inside it to the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::{ShellArgs, ShellTarget};
use crate::config::load_or_create;
use crate::environment::{Dependency, PostgresEnvironment};
use crate::error::Result;
use crate::runtime::ContainerRuntime;
use crate::service::ManagedService;
use crate::state::{ServiceRegistry, StateDir};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::services::ServiceOptions;

/// The shell command implementation.
pub struct ShellCommand {
    project_root: PathBuf,
    args: ShellArgs,
    runtime: Arc<dyn ContainerRuntime>,
    options: ServiceOptions,
}

impl ShellCommand {
    /// Create a new shell command.
    pub fn new(project_root: &Path, args: ShellArgs, runtime: Arc<dyn ContainerRuntime>) -> Self {
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

    fn dependency(&self) -> Dependency {
        match self.args.service {
            ShellTarget::Db => Dependency::Postgres,
            ShellTarget::Redis => Dependency::Redis,
        }
    }
}

/// The client to run inside the container.
fn client_command(dependency: Dependency) -> Vec<String> {
    match dependency {
        Dependency::Postgres => {
            let env = PostgresEnvironment::local();
            vec!["psql".to_string(), "-U".to_string(), env.user, env.db]
        }
        Dependency::Redis => vec!["redis-cli".to_string()],
    }
}

impl Command for ShellCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let dependency = self.dependency();
        let config = load_or_create(&self.project_root)?;
        if !config.is_enabled(dependency) {
            ui.error(&format!("{} is disabled in berth.yml", dependency));
            return Ok(CommandResult::failure(2));
        }

        self.runtime.ping()?;
        let state_dir = StateDir::ensure(&self.project_root)?;
        let registry = Arc::new(ServiceRegistry::new(state_dir.registry_file()));
        let mut service = self.options.configure_service(
            dependency,
            ManagedService::for_dependency(
                dependency,
                Arc::clone(&self.runtime),
                registry,
                &state_dir,
            ),
        );

        let mut spinner = ui.start_spinner(&format!("Starting {}", service.name()));
        match service.start() {
            Ok(_) => spinner.finish_success(&format!("{} ready", service.name())),
            Err(e) => {
                spinner.finish_error(&format!("{} failed to start", service.name()));
                return Err(e);
            }
        }

        let code = service.exec(&client_command(dependency))?;
        Ok(CommandResult::from_exit_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RuntimeCall};
    use crate::service::{FnProbe, PollPolicy, ReadinessProbe};
    use crate::ui::MockUI;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn ready_options() -> ServiceOptions {
        ServiceOptions::new()
            .with_probes(Arc::new(|_: Dependency| -> Box<dyn ReadinessProbe> {
                Box::new(FnProbe::new("ready", || true))
            }))
            .with_poll_policy(PollPolicy::new(
                Duration::from_millis(1),
                Duration::from_millis(200),
            ))
    }

    #[test]
    fn db_shell_runs_psql() {
        let temp = TempDir::new().unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let cmd = ShellCommand::new(
            temp.path(),
            ShellArgs {
                service: ShellTarget::Db,
            },
            runtime.clone(),
        )
        .with_options(ready_options());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(runtime.calls().contains(&RuntimeCall::Exec(
            "berth_postgres".to_string(),
            vec![
                "psql".to_string(),
                "-U".to_string(),
                "postgres".to_string(),
                "postgres".to_string()
            ]
        )));
    }

    #[test]
    fn redis_shell_runs_redis_cli() {
        let temp = TempDir::new().unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let cmd = ShellCommand::new(
            temp.path(),
            ShellArgs {
                service: ShellTarget::Redis,
            },
            runtime.clone(),
        )
        .with_options(ready_options());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert!(runtime.calls().contains(&RuntimeCall::Exec(
            "berth_redis".to_string(),
            vec!["redis-cli".to_string()]
        )));
        assert_eq!(ui.spinners(), ["Starting berth_redis"]);
    }

    #[test]
    fn disabled_service_is_refused() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("berth.yml"), "enable_worker: false\n").unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let cmd = ShellCommand::new(
            temp.path(),
            ShellArgs {
                service: ShellTarget::Redis,
            },
            runtime.clone(),
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert_eq!(ui.errors(), ["redis is disabled in berth.yml"]);
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn client_commands() {
        assert_eq!(client_command(Dependency::Redis), vec!["redis-cli"]);
        assert_eq!(client_command(Dependency::Postgres)[0], "psql");
    }
}
