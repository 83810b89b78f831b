//! Service startup settings shared by `up`, `configure` and `shell`.

use std::sync::Arc;

use crate::environment::Dependency;
use crate::framework::{FrameworkHandler, ProbeFactory};
use crate::service::{ManagedService, PollPolicy};

/// Replacement probes and polling for commands that start services.
///
/// The defaults are the real network probes and [`PollPolicy::default`].
#[derive(Clone, Default)]
pub struct ServiceOptions {
    probes: Option<Arc<ProbeFactory>>,
    poll: PollPolicy,
}

impl ServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probes(mut self, probes: Arc<ProbeFactory>) -> Self {
        self.probes = Some(probes);
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn configure_handler(&self, handler: FrameworkHandler) -> FrameworkHandler {
        let handler = handler.with_poll_policy(self.poll);
        match &self.probes {
            Some(probes) => {
                let probes = Arc::clone(probes);
                handler.with_probes(move |dependency| probes(dependency))
            }
            None => handler,
        }
    }

    pub fn configure_service(
        &self,
        dependency: Dependency,
        service: ManagedService,
    ) -> ManagedService {
        let service = service.with_poll_policy(self.poll);
        match &self.probes {
            Some(probes) => service.with_probe(probes(dependency)),
            None => service,
        }
    }
}
