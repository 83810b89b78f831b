//! External program execution.

use crate::error::{BerthError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a program.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the program succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// Trimmed stderr, falling back to stdout when stderr is empty.
    pub fn error_output(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Options for program execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

/// Render a program invocation for error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a program with arguments and capture its output.
///
/// A non-zero exit is reported through [`CommandResult::success`]; only a
/// failure to spawn the program is an error.
pub fn run(program: &str, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = cmd.output().map_err(|_| BerthError::CommandFailed {
        command: display_command(program, args),
        code: None,
    })?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    tracing::debug!(
        "{} exited with {:?} in {:?}",
        display_command(program, args),
        output.status.code(),
        duration
    );

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Run a program attached to the current terminal, returning its exit code.
pub fn run_interactive(program: &str, args: &[String]) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|_| BerthError::CommandFailed {
            command: display_command(program, args),
            code: None,
        })?;

    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[cfg(unix)]
    #[test]
    fn run_successful_program() {
        let result = run("echo", &args(&["hello"]), &CommandOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn run_failing_program() {
        let result = run("sh", &args(&["-c", "echo oops >&2; exit 3"]), &CommandOptions::default())
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.error_output(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn run_passes_environment() {
        let mut options = CommandOptions::default();
        options.env.insert("BERTH_TEST_VALUE".into(), "42".into());
        let result = run("sh", &args(&["-c", "echo $BERTH_TEST_VALUE"]), &options).unwrap();
        assert!(result.stdout.contains("42"));
    }

    #[test]
    fn run_missing_program_is_error() {
        let err = run(
            "berth-definitely-not-a-program",
            &args(&["--version"]),
            &CommandOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BerthError::CommandFailed { code: None, .. }));
        assert!(err.to_string().contains("berth-definitely-not-a-program --version"));
    }

    #[test]
    fn error_output_prefers_stderr() {
        let result = CommandResult::failure(
            Some(1),
            "out".into(),
            "  err \n".into(),
            Duration::ZERO,
        );
        assert_eq!(result.error_output(), "err");
        let result = CommandResult::failure(Some(1), "out\n".into(), String::new(), Duration::ZERO);
        assert_eq!(result.error_output(), "out");
    }
}
