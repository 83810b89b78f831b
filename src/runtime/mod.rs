//! Container runtime abstraction.
//!
//! [`ContainerRuntime`] is the only way the rest of berth talks to the
//! container engine. [`DockerCli`] drives the `docker` binary;
//! [`MockRuntime`] keeps containers in memory for tests.

pub mod docker;
pub mod mock;

pub use docker::DockerCli;
pub use mock::{MockRuntime, RuntimeCall};

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::service::ServiceSpec;

/// Lifecycle status reported by the engine for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    /// Whether restarting in place brings the container back.
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Paused | Self::Restarting | Self::Exited
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
        }
    }
}

impl FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "restarting" => Ok(Self::Restarting),
            "removing" => Ok(Self::Removing),
            "exited" => Ok(Self::Exited),
            "dead" => Ok(Self::Dead),
            other => Err(format!("unknown container status: {}", other)),
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: ContainerStatus,
}

/// Outcome of stopping a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// The container was already gone.
    NotFound,
}

/// Operations berth needs from a container engine.
///
/// Implementations must be shareable across the threads that start
/// independent services concurrently.
pub trait ContainerRuntime: Send + Sync {
    /// Check that the engine is reachable.
    fn ping(&self) -> Result<()>;

    /// Whether the image is present locally.
    fn image_exists(&self, image: &str) -> Result<bool>;

    /// Pull an image from its registry.
    fn pull_image(&self, image: &str) -> Result<()>;

    /// Find a container by its exact name.
    fn find_container(&self, name: &str) -> Result<Option<ContainerInfo>>;

    /// Create and start a detached container, returning its id.
    fn run_container(&self, spec: &ServiceSpec) -> Result<String>;

    /// Bring a stopped or paused container back to running.
    fn restart_container(&self, container: &ContainerInfo) -> Result<()>;

    /// Stop a container, reporting whether it existed.
    fn stop_container(&self, id: &str) -> Result<StopOutcome>;

    /// Run an interactive command inside a container, returning its exit code.
    fn exec_interactive(&self, name: &str, command: &[String]) -> Result<i32>;
}
