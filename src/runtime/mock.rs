//! In-memory container runtime for testing.
//!
//! `MockRuntime` implements [`ContainerRuntime`] over a table of fake
//! containers and records every call for later assertion.
//!
//! # Example
//!
//! ```
//! use berth::runtime::{ContainerRuntime, ContainerStatus, MockRuntime};
//! use berth::service::ServiceSpec;
//!
//! let runtime = MockRuntime::new().with_container("berth_redis", ContainerStatus::Exited);
//! let existing = runtime.find_container("berth_redis").unwrap().unwrap();
//! runtime.restart_container(&existing).unwrap();
//! assert_eq!(
//!     runtime.container("berth_redis").unwrap().status,
//!     ContainerStatus::Running
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{ContainerInfo, ContainerRuntime, ContainerStatus, StopOutcome};
use crate::error::{BerthError, Result};
use crate::service::ServiceSpec;

/// A call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Ping,
    ImageExists(String),
    PullImage(String),
    FindContainer(String),
    RunContainer(String),
    RestartContainer(String),
    StopContainer(String),
    Exec(String, Vec<String>),
}

#[derive(Debug, Default)]
struct State {
    images: BTreeSet<String>,
    containers: BTreeMap<String, ContainerInfo>,
    calls: Vec<RuntimeCall>,
    next_id: u32,
}

/// Mock runtime.
#[derive(Debug, Default)]
pub struct MockRuntime {
    state: Mutex<State>,
    unavailable: bool,
    pull_failure: Option<String>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the image is already present.
    pub fn with_image(self, image: &str) -> Self {
        self.lock().images.insert(image.to_string());
        self
    }

    /// Pretend a container with this name exists in the given status.
    pub fn with_container(self, name: &str, status: ContainerStatus) -> Self {
        {
            let mut state = self.lock();
            let id = state.allocate_id();
            state.containers.insert(
                name.to_string(),
                ContainerInfo {
                    id,
                    name: name.to_string(),
                    status,
                },
            );
        }
        self
    }

    /// Make every call fail as if the engine were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Make image pulls fail with this message.
    pub fn with_pull_failure(mut self, message: &str) -> Self {
        self.pull_failure = Some(message.to_string());
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.lock().calls.clone()
    }

    /// Number of containers created through `run_container`.
    pub fn run_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RuntimeCall::RunContainer(_)))
            .count()
    }

    /// Look up a container by name.
    pub fn container(&self, name: &str) -> Option<ContainerInfo> {
        self.lock().containers.get(name).cloned()
    }

    /// All containers, ordered by name.
    pub fn containers(&self) -> Vec<ContainerInfo> {
        self.lock().containers.values().cloned().collect()
    }

    /// Remove a container out-of-band.
    pub fn remove_container(&self, name: &str) {
        self.lock().containers.remove(name);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RuntimeCall) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        if self.unavailable {
            return Err(BerthError::RuntimeUnavailable {
                message: "mock runtime is unavailable".to_string(),
            });
        }
        Ok(state)
    }
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:064x}", self.next_id)
    }
}

impl ContainerRuntime for MockRuntime {
    fn ping(&self) -> Result<()> {
        self.record(RuntimeCall::Ping).map(|_| ())
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        let state = self.record(RuntimeCall::ImageExists(image.to_string()))?;
        Ok(state.images.contains(image))
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        let mut state = self.record(RuntimeCall::PullImage(image.to_string()))?;
        if let Some(message) = &self.pull_failure {
            return Err(BerthError::ImagePull {
                image: image.to_string(),
                message: message.clone(),
            });
        }
        state.images.insert(image.to_string());
        Ok(())
    }

    fn find_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        let state = self.record(RuntimeCall::FindContainer(name.to_string()))?;
        Ok(state.containers.get(name).cloned())
    }

    fn run_container(&self, spec: &ServiceSpec) -> Result<String> {
        let mut state = self.record(RuntimeCall::RunContainer(spec.name.clone()))?;
        if state.containers.contains_key(&spec.name) {
            return Err(BerthError::CommandFailed {
                command: format!("docker run --name {}", spec.name),
                code: Some(125),
            });
        }
        if !state.images.contains(&spec.image) {
            return Err(anyhow::anyhow!("image {} is not present", spec.image).into());
        }
        let id = state.allocate_id();
        state.containers.insert(
            spec.name.clone(),
            ContainerInfo {
                id: id.clone(),
                name: spec.name.clone(),
                status: ContainerStatus::Running,
            },
        );
        Ok(id)
    }

    fn restart_container(&self, container: &ContainerInfo) -> Result<()> {
        let mut state = self.record(RuntimeCall::RestartContainer(container.id.clone()))?;
        match state
            .containers
            .values_mut()
            .find(|c| c.id == container.id)
        {
            Some(existing) => {
                existing.status = ContainerStatus::Running;
                Ok(())
            }
            None => Err(BerthError::CommandFailed {
                command: format!("docker restart {}", container.id),
                code: Some(1),
            }),
        }
    }

    fn stop_container(&self, id: &str) -> Result<StopOutcome> {
        let mut state = self.record(RuntimeCall::StopContainer(id.to_string()))?;
        match state.containers.values_mut().find(|c| c.id == id) {
            Some(existing) => {
                existing.status = ContainerStatus::Exited;
                Ok(StopOutcome::Stopped)
            }
            None => Ok(StopOutcome::NotFound),
        }
    }

    fn exec_interactive(&self, name: &str, command: &[String]) -> Result<i32> {
        let state = self.record(RuntimeCall::Exec(name.to_string(), command.to_vec()))?;
        Ok(if state.containers.contains_key(name) { 0 } else { 1 })
    }
}
