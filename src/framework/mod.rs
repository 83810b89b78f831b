//! Framework configuration.
//!
//! [`FrameworkHandler::run`] is the entry point used by `berth configure`:
//!
//! 1. decide whether the process runs remotely
//! 2. when local, start every enabled managed service
//! 3. resolve each enabled dependency's connection environment
//! 4. on remote hosts, add the framework's production settings
//! 5. apply everything to the settings in one merge, collecting warnings

pub mod django;

pub use django::Django;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::BerthConfig;
use crate::environment::{
    resolve_with_env, system_env, ConnectionEnvironment, Dependency, EnvLookup, Platform,
    PostgresEnvironment, RedisEnvironment,
};
use crate::error::Result;
use crate::runtime::ContainerRuntime;
use crate::service::{ManagedService, PollPolicy, ReadinessProbe};
use crate::settings::{FrameworkSettings, MergeWarning, SettingsPatch};
use crate::state::{ServiceRegistry, StateDir};

/// Translates connection environments into one web framework's settings.
pub trait Framework: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the settings say the app is running in local debug mode.
    fn is_debug(&self, settings: &FrameworkSettings) -> bool;

    fn postgres_patch(&self, env: &PostgresEnvironment) -> SettingsPatch;

    fn redis_patch(&self, env: &RedisEnvironment) -> SettingsPatch;

    /// Settings every remote deployment needs (hosts, debug off, secrets).
    fn remote_patch(
        &self,
        platform: Platform,
        settings: &FrameworkSettings,
        env_fn: &EnvLookup,
    ) -> SettingsPatch;
}

/// Builds the readiness probe for a dependency.
pub type ProbeFactory = dyn Fn(Dependency) -> Box<dyn ReadinessProbe> + Send + Sync;

/// A local service that reached the ready state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedService {
    pub dependency: Dependency,
    pub name: String,
    pub container_id: String,
}

/// Outcome of [`FrameworkHandler::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub platform: Platform,
    pub is_remote: bool,
    pub started: Vec<StartedService>,
    #[serde(skip)]
    pub warnings: Vec<MergeWarning>,
}

/// Starts local services and writes connection settings for a framework.
pub struct FrameworkHandler {
    framework: Box<dyn Framework>,
    config: BerthConfig,
    project_root: PathBuf,
    runtime: Arc<dyn ContainerRuntime>,
    env_fn: Box<EnvLookup>,
    probes: Option<Box<ProbeFactory>>,
    poll: PollPolicy,
}

impl FrameworkHandler {
    pub fn new(
        framework: Box<dyn Framework>,
        config: BerthConfig,
        project_root: &Path,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            framework,
            config,
            project_root: project_root.to_path_buf(),
            runtime,
            env_fn: Box::new(system_env),
            probes: None,
            poll: PollPolicy::default(),
        }
    }

    /// Read environment variables through `env_fn` instead of the process.
    pub fn with_env<F>(mut self, env_fn: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError> + 'static,
    {
        self.env_fn = Box::new(env_fn);
        self
    }

    /// Replace the network probes used to wait for readiness.
    pub fn with_probes<F>(mut self, factory: F) -> Self
    where
        F: Fn(Dependency) -> Box<dyn ReadinessProbe> + Send + Sync + 'static,
    {
        self.probes = Some(Box::new(factory));
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn config(&self) -> &BerthConfig {
        &self.config
    }

    pub fn framework(&self) -> &dyn Framework {
        self.framework.as_ref()
    }

    /// Decide the platform and whether we are remote.
    ///
    /// Remote when `BERTH_PLATFORM` names a remote platform, or when the
    /// framework's settings say debug mode is off. Local runs always use
    /// [`Platform::Local`]; a remote run with no remote platform named is
    /// [`Platform::UnknownRemote`].
    pub fn detect(&self, settings: &FrameworkSettings) -> (Platform, bool) {
        let env_fn = self.env_fn.as_ref();
        let detected = Platform::detect_with_env(env_fn);
        let signal = Platform::signal_present_with_env(env_fn) && detected.is_remote();
        let debug_off = !self.framework.is_debug(settings);
        let is_remote = signal || debug_off;

        let platform = match (is_remote, detected.is_remote()) {
            (false, _) => Platform::Local,
            (true, true) => detected,
            (true, false) => Platform::UnknownRemote,
        };
        debug!(
            "Platform {} (signal: {}, debug off: {})",
            platform, signal, debug_off
        );
        (platform, is_remote)
    }

    fn build_service(
        &self,
        dependency: Dependency,
        registry: &Arc<ServiceRegistry>,
        state_dir: &StateDir,
    ) -> ManagedService {
        let service = ManagedService::for_dependency(
            dependency,
            Arc::clone(&self.runtime),
            Arc::clone(registry),
            state_dir,
        )
        .with_poll_policy(self.poll);
        match &self.probes {
            Some(factory) => service.with_probe(factory(dependency)),
            None => service,
        }
    }

    /// Start every enabled service and wait until all are ready.
    ///
    /// Services start concurrently. All of them are waited on; if any
    /// failed, the first failure in dependency order is returned.
    pub fn start_services(&self) -> Result<Vec<StartedService>> {
        let dependencies = self.config.dependencies();
        if dependencies.is_empty() {
            return Ok(Vec::new());
        }

        self.runtime.ping()?;
        let state_dir = StateDir::ensure(&self.project_root)?;
        let registry = Arc::new(ServiceRegistry::new(state_dir.registry_file()));

        let services: Vec<(Dependency, ManagedService)> = dependencies
            .into_iter()
            .map(|d| (d, self.build_service(d, &registry, &state_dir)))
            .collect();

        let results: Vec<Result<StartedService>> = thread::scope(|scope| {
            let handles: Vec<_> = services
                .into_iter()
                .map(|(dependency, mut service)| {
                    scope.spawn(move || {
                        let container_id = service.start()?;
                        Ok(StartedService {
                            dependency,
                            name: service.name().to_string(),
                            container_id,
                        })
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(anyhow::anyhow!("service start thread panicked").into())
                    })
                })
                .collect()
        });

        let started = results.into_iter().collect::<Result<Vec<_>>>()?;
        for service in &started {
            info!("{} is ready", service.name);
        }
        Ok(started)
    }

    /// Resolve every enabled dependency and turn it into settings writes.
    ///
    /// Patches are ordered by dependency, so the database block is always
    /// applied before the broker settings.
    pub fn connection_patch(&self, platform: Platform) -> Result<SettingsPatch> {
        let mut patch = SettingsPatch::new();
        for environment in self.resolve(platform)? {
            let next = match &environment {
                ConnectionEnvironment::Postgres(env) => self.framework.postgres_patch(env),
                ConnectionEnvironment::Redis(env) => self.framework.redis_patch(env),
            };
            patch = patch.merge(next);
        }
        Ok(patch)
    }

    /// Connection environments of all enabled dependencies.
    pub fn resolve(&self, platform: Platform) -> Result<Vec<ConnectionEnvironment>> {
        self.config
            .dependencies()
            .into_iter()
            .map(|d| resolve_with_env(d, platform, self.env_fn.as_ref()))
            .collect()
    }

    /// Configure `settings` in place for the current platform.
    pub fn run(&self, settings: &mut FrameworkSettings) -> Result<RunReport> {
        let (platform, is_remote) = self.detect(settings);
        info!(
            "Configuring {} for {}",
            self.framework.name(),
            if is_remote { platform.identifier() } else { "local development" }
        );

        let started = if is_remote {
            Vec::new()
        } else {
            self.start_services()?
        };

        let mut patch = self.connection_patch(platform)?;
        if is_remote {
            patch = patch.merge(
                self.framework
                    .remote_patch(platform, settings, self.env_fn.as_ref()),
            );
        }

        let warnings = settings.apply(&patch);
        Ok(RunReport {
            platform,
            is_remote,
            started,
            warnings,
        })
    }
}
