//! Env command implementation.
//!
//! The `berth env` command prints the connection environment of every
//! enabled dependency for the detected (or given) platform. It never starts
//! containers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use crate::cli::args::{EnvArgs, EnvFormat};
use crate::config::load;
use crate::environment::{resolve_with_env, system_env, Platform};
use crate::error::Result;
use crate::ui::{BerthTheme, OutputMode, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display;
use super::SharedEnv;

/// The env command implementation.
pub struct EnvCommand {
    project_root: PathBuf,
    args: EnvArgs,
    env_fn: Arc<SharedEnv>,
}

impl EnvCommand {
    /// Create a new env command.
    pub fn new(project_root: &Path, args: EnvArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
            env_fn: Arc::new(system_env),
        }
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
    pub fn args(&self) -> &EnvArgs {
        &self.args
    }

    /// The `--platform` override, else `BERTH_PLATFORM` when set, else local.
    fn platform(&self) -> std::result::Result<Platform, String> {
        if let Some(name) = &self.args.platform {
            return Platform::from_identifier(name).ok_or_else(|| name.clone());
        }
        let env_fn = self.env_fn.as_ref();
        if Platform::signal_present_with_env(env_fn) {
            Ok(Platform::detect_with_env(env_fn))
        } else {
            Ok(Platform::Local)
        }
    }
}

impl Command for EnvCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let platform = match self.platform() {
            Ok(platform) => platform,
            Err(name) => {
                let known: Vec<&str> = Platform::ALL.iter().map(|p| p.identifier()).collect();
                ui.error(&format!(
                    "Unknown platform '{}'. Expected one of: {}",
                    name,
                    known.join(", ")
                ));
                return Ok(CommandResult::failure(2));
            }
        };

        let config = load(&self.project_root)?;
        let environments = config
            .dependencies()
            .into_iter()
            .map(|d| resolve_with_env(d, platform, self.env_fn.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        match self.args.format {
            EnvFormat::Json => {
                let output = json!({
                    "platform": platform,
                    "environments": environments,
                });
                let rendered = serde_json::to_string_pretty(&output)
                    .map_err(|e| anyhow::anyhow!("Failed to render environment: {}", e))?;
                ui.message(&rendered);
            }
            EnvFormat::Text => {
                let theme = BerthTheme::new();
                let reveal = ui.output_mode() == OutputMode::Verbose;
                ui.show_header(&format!("Connection environment ({})", platform));
                if environments.is_empty() {
                    ui.message("No services are enabled in berth.yml");
                }
                for environment in &environments {
                    ui.message(&format!(
                        "{}",
                        theme.highlight.apply_to(environment.dependency())
                    ));
                    for line in display::environment_lines(environment, &theme, reveal) {
                        ui.message(&line);
                    }
                }
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::make_env;
    use crate::error::BerthError;
    use crate::ui::MockUI;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn args(format: EnvFormat, platform: Option<&str>) -> EnvArgs {
        EnvArgs {
            format,
            platform: platform.map(String::from),
        }
    }

    #[test]
    fn local_by_default() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, None)).with_env(make_env(&[]));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert_eq!(ui.headers(), ["Connection environment (local)"]);
        assert!(ui.messages().iter().any(|m| m.contains("localhost")));
        assert!(!temp.path().join("berth.yml").exists());
    }

    #[test]
    fn text_masks_passwords() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, None)).with_env(make_env(&[
            ("BERTH_PLATFORM", "render"),
            ("DATABASE_URL", "postgres://app:topsecret@db:5432/shop"),
            ("REDIS_URL", "redis://cache:6379/0"),
        ]));
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert!(ui.messages().iter().any(|m| m.contains("db")));
        assert!(!ui.messages().iter().any(|m| m.contains("topsecret")));
    }

    #[test]
    fn verbose_reveals_passwords() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, None)).with_env(make_env(&[
            ("BERTH_PLATFORM", "render"),
            ("DATABASE_URL", "postgres://app:topsecret@db:5432/shop"),
            ("REDIS_URL", "redis://cache:6379/0"),
        ]));
        let mut ui = MockUI::with_mode(OutputMode::Verbose);

        cmd.execute(&mut ui).unwrap();

        assert!(ui.messages().iter().any(|m| m.contains("topsecret")));
    }

    #[test]
    fn json_output_is_parseable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("berth.yml"), "enable_worker: false\n").unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Json, Some("unknown_remote")))
            .with_env(make_env(&[("POSTGRES_HOST", "pg.internal"), ("POSTGRES_PORT", "6543")]));
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let value: Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(value["platform"], "unknown_remote");
        let environments = value["environments"].as_array().unwrap();
        assert_eq!(environments.len(), 1);
        assert_eq!(environments[0]["dependency"], "postgres");
        assert_eq!(environments[0]["host"], "pg.internal");
        assert_eq!(environments[0]["port"], 6543);
    }

    #[test]
    fn platform_flag_overrides_environment() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, Some("local")))
            .with_env(make_env(&[("BERTH_PLATFORM", "render")]));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert_eq!(ui.headers(), ["Connection environment (local)"]);
    }

    #[test]
    fn unknown_platform_flag_fails() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, Some("fly")));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.errors()[0].contains("fly"));
    }

    #[test]
    fn unsupported_platform_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cmd = EnvCommand::new(temp.path(), args(EnvFormat::Text, None))
            .with_env(make_env(&[("BERTH_PLATFORM", "railway")]));
        let mut ui = MockUI::new();

        let err = cmd.execute(&mut ui).unwrap_err();

        assert!(matches!(
            err,
            BerthError::UnsupportedPlatform {
                platform: Platform::Railway,
                ..
            }
        ));
    }
}
