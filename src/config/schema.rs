//! Schema for `berth.yml`.

use serde::{Deserialize, Serialize};

use crate::environment::Dependency;

/// Root configuration structure for berth.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BerthConfig {
    /// Provision a PostgreSQL database.
    pub enable_postgres: bool,

    /// Provision a Redis broker for background workers.
    pub enable_worker: bool,
}

impl Default for BerthConfig {
    fn default() -> Self {
        Self {
            enable_postgres: true,
            enable_worker: true,
        }
    }
}

impl BerthConfig {
    /// Enabled dependencies, in the order they must be configured.
    pub fn dependencies(&self) -> Vec<Dependency> {
        Dependency::ALL
            .into_iter()
            .filter(|d| self.is_enabled(*d))
            .collect()
    }

    pub fn is_enabled(&self, dependency: Dependency) -> bool {
        match dependency {
            Dependency::Postgres => self.enable_postgres,
            Dependency::Redis => self.enable_worker,
        }
    }
}
