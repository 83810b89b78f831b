//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// berth - Local Postgres and Redis for web apps, configured for any host.
#[derive(Debug, Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the enabled local services (default if no command specified)
    Up(UpArgs),

    /// Write connection settings into a framework settings file
    Configure(ConfigureArgs),

    /// Show resolved connection environments
    Env(EnvArgs),

    /// Stop every container started for this project
    Stop(StopArgs),

    /// Open a shell in a service container
    Shell(ShellArgs),
}

/// Arguments for the `up` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UpArgs {}

/// Arguments for the `configure` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigureArgs {
    /// JSON file holding the framework settings
    #[arg(short, long, value_name = "FILE")]
    pub settings: PathBuf,

    /// Show what would change without writing the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for `env`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EnvFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the `env` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = EnvFormat::Text)]
    pub format: EnvFormat,

    /// Platform to resolve for (defaults to BERTH_PLATFORM, or local when unset)
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<String>,
}

/// Arguments for the `stop` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StopArgs {}

/// Service to open a shell in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShellTarget {
    /// psql in the Postgres container
    Db,
    /// redis-cli in the Redis container
    Redis,
}

/// Arguments for the `shell` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ShellArgs {
    #[arg(value_enum)]
    pub service: ShellTarget,
}
