//! Error types for berth operations.
//!
//! This module defines [`BerthError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every variant except `Io` and `Other` is fatal for the invoking command
//! - Use `anyhow::Error` (via `BerthError::Other`) for unexpected errors
//! - Non-fatal conditions (overwritten settings, unknown platforms) are
//!   never errors; they surface as warnings or fallbacks instead

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::environment::{Dependency, Platform};

/// Core error type for berth operations.
#[derive(Debug, Error)]
pub enum BerthError {
    /// The container engine could not be reached.
    #[error("Container runtime unavailable: {message}. Make sure docker is installed and running.")]
    RuntimeUnavailable { message: String },

    /// Pulling an image from its registry failed.
    #[error("Failed to pull image '{image}': {message}")]
    ImagePull { image: String, message: String },

    /// A service never answered its readiness probe within the bound.
    #[error("Service '{service}' was not ready after {timeout:?} ({attempts} probe attempts)")]
    ReadinessTimeout {
        service: String,
        timeout: Duration,
        attempts: u32,
    },

    /// A connection string on a known remote platform is missing or malformed.
    #[error("Invalid {variable}: {message}")]
    ConfigurationParse { variable: String, message: String },

    /// No resolver exists for this platform and dependency.
    #[error("Unsupported platform '{platform}' for {dependency}")]
    UnsupportedPlatform {
        platform: Platform,
        dependency: Dependency,
    },

    /// A container exists but is in a state that cannot be restarted.
    #[error("Container '{name}' is {state} and cannot be reused")]
    ContainerState { name: String, state: String },

    /// A runtime command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Failed to parse the project config file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for berth operations.
pub type Result<T> = std::result::Result<T, BerthError>;
