//! Container runtime backed by the `docker` CLI.

use tracing::{debug, info};

use super::{ContainerInfo, ContainerRuntime, ContainerStatus, StopOutcome};
use crate::error::{BerthError, Result};
use crate::service::ServiceSpec;
use crate::shell::{self, display_command, CommandOptions, CommandResult};

/// Talks to the engine by running `docker` subcommands.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }

    /// Use a different binary (e.g. `podman`, which accepts the same arguments).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run a subcommand. A missing binary or an unreachable daemon is
    /// `RuntimeUnavailable`; any other non-zero exit is left to the caller.
    fn docker(&self, args: &[String]) -> Result<CommandResult> {
        let result =
            shell::run(&self.program, args, &CommandOptions::default()).map_err(|e| match e {
                BerthError::CommandFailed { .. } => BerthError::RuntimeUnavailable {
                    message: format!("could not execute '{}'", self.program),
                },
                other => other,
            })?;
        if !result.success && is_daemon_unreachable(&result.error_output()) {
            return Err(BerthError::RuntimeUnavailable {
                message: result.error_output(),
            });
        }
        Ok(result)
    }

    fn docker_checked(&self, args: &[String]) -> Result<CommandResult> {
        let result = self.docker(args)?;
        if result.success {
            Ok(result)
        } else {
            debug!("docker failed: {}", result.error_output());
            Err(BerthError::CommandFailed {
                command: display_command(&self.program, args),
                code: result.exit_code,
            })
        }
    }
}

/// Build the argument list for `docker run`.
pub fn run_args(spec: &ServiceSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--detach".to_string(),
        "--name".to_string(),
        spec.name.clone(),
        "--restart".to_string(),
        spec.restart_policy.to_string(),
    ];

    for port in &spec.ports {
        args.push("--publish".to_string());
        args.push(format!(
            "{}:{}/{}",
            port.host_port, port.container_port, port.protocol
        ));
    }

    if let Some(volume) = &spec.volume {
        args.push("--volume".to_string());
        args.push(format!(
            "{}:{}",
            volume.host_path.display(),
            volume.container_path
        ));
    }

    for (key, value) in &spec.env {
        args.push("--env".to_string());
        args.push(format!("{}={}", key, value));
    }

    args.push(spec.image.clone());
    args
}

/// Parse one `docker ps --format '{{.ID}}|{{.Names}}|{{.State}}'` line.
fn parse_ps_line(line: &str) -> Option<ContainerInfo> {
    let mut parts = line.trim().splitn(3, '|');
    let id = parts.next()?.trim();
    let name = parts.next()?.trim();
    let status = parts.next()?.parse().ok()?;
    if id.is_empty() {
        return None;
    }
    Some(ContainerInfo {
        id: id.to_string(),
        name: name.trim_start_matches('/').to_string(),
        status,
    })
}

fn is_not_found(output: &str) -> bool {
    output.to_lowercase().contains("no such container")
}

fn is_daemon_unreachable(output: &str) -> bool {
    let output = output.to_lowercase();
    output.contains("cannot connect to the docker daemon")
        || output.contains("is the docker daemon running")
        || output.contains("error during connect")
}

fn to_args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl ContainerRuntime for DockerCli {
    fn ping(&self) -> Result<()> {
        let result = self.docker(&to_args(&["info", "--format", "{{.ServerVersion}}"]))?;
        if result.success {
            debug!("docker server version {}", result.stdout.trim());
            Ok(())
        } else {
            Err(BerthError::RuntimeUnavailable {
                message: result.error_output(),
            })
        }
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        let result = self.docker(&to_args(&["image", "inspect", "--format", "{{.Id}}", image]))?;
        Ok(result.success)
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        info!("Pulling image {}", image);
        let result = self.docker(&to_args(&["pull", image]))?;
        if result.success {
            Ok(())
        } else {
            Err(BerthError::ImagePull {
                image: image.to_string(),
                message: result.error_output(),
            })
        }
    }

    fn find_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        // Docker's name filter is a substring match; anchor it.
        let filter = format!("name=^/?{}$", name);
        let result = self.docker_checked(&to_args(&[
            "ps",
            "--all",
            "--no-trunc",
            "--filter",
            &filter,
            "--format",
            "{{.ID}}|{{.Names}}|{{.State}}",
        ]))?;

        Ok(result
            .stdout
            .lines()
            .filter_map(parse_ps_line)
            .find(|c| c.name == name))
    }

    fn run_container(&self, spec: &ServiceSpec) -> Result<String> {
        let args = run_args(spec);
        let result = self.docker_checked(&args)?;
        let id = result
            .stdout
            .lines()
            .last()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if id.is_empty() {
            return Err(anyhow::anyhow!("docker run printed no container id for {}", spec.name).into());
        }
        Ok(id)
    }

    fn restart_container(&self, container: &ContainerInfo) -> Result<()> {
        let verb = match container.status {
            ContainerStatus::Paused => "unpause",
            _ => "restart",
        };
        self.docker_checked(&to_args(&[verb, &container.id]))?;
        Ok(())
    }

    fn stop_container(&self, id: &str) -> Result<StopOutcome> {
        let args = to_args(&["stop", id]);
        let result = self.docker(&args)?;
        if result.success {
            Ok(StopOutcome::Stopped)
        } else if is_not_found(&result.error_output()) {
            Ok(StopOutcome::NotFound)
        } else {
            Err(BerthError::CommandFailed {
                command: display_command(&self.program, &args),
                code: result.exit_code,
            })
        }
    }

    fn exec_interactive(&self, name: &str, command: &[String]) -> Result<i32> {
        let mut args = to_args(&["exec", "--interactive", "--tty", name]);
        args.extend(command.iter().cloned());
        shell::run_interactive(&self.program, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn run_args_for_postgres() {
        let spec = ServiceSpec::postgres(Some(PathBuf::from("/p/.berth/pgdata")));
        let args = run_args(&spec);
        assert_eq!(args[0], "run");
        assert!(args.contains(&"--detach".to_string()));
        assert!(args.windows(2).any(|w| w == ["--name", "berth_postgres"]));
        assert!(args.windows(2).any(|w| w == ["--publish", "5432:5432/tcp"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["--volume", "/p/.berth/pgdata:/var/lib/postgresql/data"]));
        assert!(args.windows(2).any(|w| w == ["--env", "POSTGRES_USER=postgres"]));
        assert!(args.windows(2).any(|w| w == ["--restart", "unless-stopped"]));
        assert_eq!(args.last().map(String::as_str), Some("postgres:12"));
    }

    #[test]
    fn run_args_for_redis_has_no_volume() {
        let args = run_args(&ServiceSpec::redis());
        assert!(!args.contains(&"--volume".to_string()));
        assert!(args.windows(2).any(|w| w == ["--publish", "6379:6379/tcp"]));
    }

    #[test]
    fn parse_ps_line_reads_fields() {
        let info = parse_ps_line("abc123|berth_redis|exited\n").unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.name, "berth_redis");
        assert_eq!(info.status, ContainerStatus::Exited);
    }

    #[test]
    fn parse_ps_line_rejects_garbage() {
        assert!(parse_ps_line("").is_none());
        assert!(parse_ps_line("abc|name").is_none());
        assert!(parse_ps_line("abc|name|sleepy").is_none());
    }

    #[test]
    fn not_found_detection() {
        assert!(is_not_found("Error response from daemon: No such container: abc"));
        assert!(!is_not_found("permission denied"));
    }

    #[test]
    fn daemon_unreachable_detection() {
        assert!(is_daemon_unreachable(
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?"
        ));
        assert!(is_daemon_unreachable(
            "error during connect: Get \"http://%2F%2F.%2Fpipe%2Fdocker_engine/v1.24/info\""
        ));
        assert!(!is_daemon_unreachable("Error response from daemon: No such container: abc"));
    }

    /// A `docker` stand-in that always fails the way the CLI does when the
    /// daemon is down.
    #[cfg(unix)]
    fn stopped_daemon_docker(temp: &tempfile::TempDir) -> DockerCli {
        use std::os::unix::fs::PermissionsExt;

        let script = temp.path().join("docker");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        DockerCli::with_program(script.display().to_string())
    }

    #[cfg(unix)]
    #[test]
    fn stopped_daemon_is_runtime_unavailable() {
        let temp = tempfile::TempDir::new().unwrap();
        let docker = stopped_daemon_docker(&temp);
        assert!(matches!(
            docker.stop_container("abc123"),
            Err(BerthError::RuntimeUnavailable { .. })
        ));
        assert!(matches!(
            docker.find_container("berth_redis"),
            Err(BerthError::RuntimeUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn drain_keeps_registry_when_daemon_is_down() {
        use crate::state::ServiceRegistry;

        let temp = tempfile::TempDir::new().unwrap();
        let docker = stopped_daemon_docker(&temp);
        let registry = ServiceRegistry::new(temp.path().join(".berth").join("containers"));
        registry.register("abc123").unwrap();

        assert!(matches!(
            registry.drain(&docker),
            Err(BerthError::RuntimeUnavailable { .. })
        ));
        assert!(registry.path().exists());
        assert_eq!(registry.entries().unwrap(), vec!["abc123"]);
    }

    #[test]
    fn missing_binary_is_runtime_unavailable() {
        let docker = DockerCli::with_program("berth-no-such-docker");
        assert!(matches!(
            docker.ping(),
            Err(BerthError::RuntimeUnavailable { .. })
        ));
    }
}
