//! Container lifecycle for one dependency.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use super::lock::ServiceLock;
use super::probe::{PostgresProbe, ReadinessProbe, RedisProbe};
use super::retry::{poll_until, PollPolicy};
use super::spec::ServiceSpec;
use crate::environment::{Dependency, PostgresEnvironment, RedisEnvironment};
use crate::error::{BerthError, Result};
use crate::runtime::{ContainerRuntime, ContainerStatus};
use crate::state::{ServiceRegistry, StateDir};

/// Where a managed service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unstarted,
    ImageEnsured,
    ContainerRunning,
    Ready,
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Unstarted => "unstarted",
            ServiceState::ImageEnsured => "image ensured",
            ServiceState::ContainerRunning => "container running",
            ServiceState::Ready => "ready",
            ServiceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Brings one container to a ready state and records it for teardown.
pub struct ManagedService {
    spec: ServiceSpec,
    runtime: Arc<dyn ContainerRuntime>,
    probe: Box<dyn ReadinessProbe>,
    registry: Arc<ServiceRegistry>,
    lock_dir: Option<PathBuf>,
    poll: PollPolicy,
    state: ServiceState,
    container_id: Option<String>,
}

impl fmt::Debug for ManagedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedService")
            .field("name", &self.spec.name)
            .field("probe", &self.probe.name())
            .field("state", &self.state)
            .field("container_id", &self.container_id)
            .finish()
    }
}

impl ManagedService {
    pub fn new(
        spec: ServiceSpec,
        runtime: Arc<dyn ContainerRuntime>,
        probe: Box<dyn ReadinessProbe>,
        registry: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            spec,
            runtime,
            probe,
            registry,
            lock_dir: None,
            poll: PollPolicy::default(),
            state: ServiceState::Unstarted,
            container_id: None,
        }
    }

    /// The project's Postgres container, with its data under `.berth/pgdata`.
    pub fn postgres(
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<ServiceRegistry>,
        state_dir: &StateDir,
    ) -> Self {
        let env = PostgresEnvironment::local();
        Self::new(
            ServiceSpec::postgres(Some(state_dir.pgdata())),
            runtime,
            Box::new(PostgresProbe::new(env.host, env.port, env.user)),
            registry,
        )
        .with_lock_dir(state_dir.locks())
    }

    /// The project's Redis container.
    pub fn redis(
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<ServiceRegistry>,
        state_dir: &StateDir,
    ) -> Self {
        let env = RedisEnvironment::local();
        Self::new(
            ServiceSpec::redis(),
            runtime,
            Box::new(RedisProbe::new(env.host, env.port)),
            registry,
        )
        .with_lock_dir(state_dir.locks())
    }

    /// The managed container backing a dependency.
    pub fn for_dependency(
        dependency: Dependency,
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<ServiceRegistry>,
        state_dir: &StateDir,
    ) -> Self {
        match dependency {
            Dependency::Postgres => Self::postgres(runtime, registry, state_dir),
            Dependency::Redis => Self::redis(runtime, registry, state_dir),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Serialize container lookup and creation through a lock file in `dir`.
    pub fn with_lock_dir(mut self, dir: PathBuf) -> Self {
        self.lock_dir = Some(dir);
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Id of the container, once one has been found or created.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Make sure the container exists, is running and answers its probe.
    ///
    /// Safe to call repeatedly: an existing container is reused and the
    /// registry never gets a duplicate line. Only a container that became
    /// ready is registered. Returns the container id.
    pub fn start(&mut self) -> Result<String> {
        match self.run_lifecycle() {
            Ok(id) => Ok(id),
            Err(e) => {
                debug!("{} failed in state '{}': {}", self.spec.name, self.state, e);
                self.state = ServiceState::Failed;
                Err(e)
            }
        }
    }

    fn run_lifecycle(&mut self) -> Result<String> {
        self.ensure_image()?;
        self.transition(ServiceState::ImageEnsured);

        let id = self.ensure_container()?;
        self.container_id = Some(id.clone());
        self.transition(ServiceState::ContainerRunning);

        self.wait_ready()?;
        self.registry.register(&id)?;
        self.transition(ServiceState::Ready);
        Ok(id)
    }

    fn transition(&mut self, next: ServiceState) {
        debug!("{}: {} -> {}", self.spec.name, self.state, next);
        self.state = next;
    }

    fn ensure_image(&self) -> Result<()> {
        if self.runtime.image_exists(&self.spec.image)? {
            debug!("Image {} present", self.spec.image);
            return Ok(());
        }
        self.runtime.pull_image(&self.spec.image)
    }

    fn ensure_container(&self) -> Result<String> {
        let _lock = match &self.lock_dir {
            Some(dir) => Some(ServiceLock::acquire(dir, &self.spec.name)?),
            None => None,
        };

        match self.runtime.find_container(&self.spec.name)? {
            None => {
                info!("Creating container {} from {}", self.spec.name, self.spec.image);
                self.runtime.run_container(&self.spec)
            }
            Some(existing) if existing.status == ContainerStatus::Running => {
                debug!("Container {} already running", self.spec.name);
                Ok(existing.id)
            }
            Some(existing) if existing.status.is_restartable() => {
                info!(
                    "Restarting {} container {}",
                    existing.status, self.spec.name
                );
                self.runtime.restart_container(&existing)?;
                Ok(existing.id)
            }
            Some(existing) => Err(BerthError::ContainerState {
                name: existing.name,
                state: existing.status.to_string(),
            }),
        }
    }

    fn wait_ready(&self) -> Result<()> {
        let probe = &self.probe;
        match poll_until(&self.poll, || probe.check()) {
            Ok(attempts) => {
                debug!("{} ready after {} probe attempts", self.spec.name, attempts);
                Ok(())
            }
            Err(timeout) => Err(BerthError::ReadinessTimeout {
                service: self.spec.name.clone(),
                timeout: self.poll.timeout,
                attempts: timeout.attempts,
            }),
        }
    }

    /// Run a command inside the container attached to the terminal.
    pub fn exec(&self, command: &[String]) -> Result<i32> {
        self.runtime.exec_interactive(&self.spec.name, command)
    }
}
