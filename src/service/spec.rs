//! Container specifications for managed services.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::environment::defaults;

/// A host port published for a container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: &'static str,
}

impl PortMapping {
    pub fn tcp(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port,
            protocol: "tcp",
        }
    }
}

/// A host directory mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMapping {
    pub host_path: PathBuf,
    pub container_path: String,
}

/// What the engine does when the container exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    No,
    Always,
    #[default]
    UnlessStopped,
    OnFailure,
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RestartPolicy::No => "no",
            RestartPolicy::Always => "always",
            RestartPolicy::UnlessStopped => "unless-stopped",
            RestartPolicy::OnFailure => "on-failure",
        })
    }
}

/// Everything needed to create a service container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub image: String,
    /// Container name; unique per host.
    pub name: String,
    pub ports: Vec<PortMapping>,
    pub volume: Option<VolumeMapping>,
    pub restart_policy: RestartPolicy,
    pub env: BTreeMap<String, String>,
}

impl ServiceSpec {
    /// The local PostgreSQL container.
    ///
    /// When `data_dir` is given it is mounted as the data directory so the
    /// database survives container removal.
    pub fn postgres(data_dir: Option<PathBuf>) -> Self {
        let env = BTreeMap::from([
            ("POSTGRES_USER".to_string(), defaults::postgres::USER.to_string()),
            (
                "POSTGRES_PASSWORD".to_string(),
                defaults::postgres::PASSWORD.to_string(),
            ),
            ("POSTGRES_DB".to_string(), defaults::postgres::DB.to_string()),
        ]);
        Self {
            image: defaults::postgres::IMAGE.to_string(),
            name: defaults::postgres::CONTAINER_NAME.to_string(),
            ports: vec![PortMapping::tcp(
                defaults::postgres::CONTAINER_PORT,
                defaults::postgres::PORT,
            )],
            volume: data_dir.map(|host_path| VolumeMapping {
                host_path,
                container_path: defaults::postgres::DATA_DIR.to_string(),
            }),
            restart_policy: RestartPolicy::UnlessStopped,
            env,
        }
    }

    /// The local Redis container.
    pub fn redis() -> Self {
        Self {
            image: defaults::redis::IMAGE.to_string(),
            name: defaults::redis::CONTAINER_NAME.to_string(),
            ports: vec![PortMapping::tcp(
                defaults::redis::CONTAINER_PORT,
                defaults::redis::PORT,
            )],
            volume: None,
            restart_policy: RestartPolicy::UnlessStopped,
            env: BTreeMap::new(),
        }
    }

    /// The host port published for a container port, if any.
    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        self.ports
            .iter()
            .find(|p| p.container_port == container_port)
            .map(|p| p.host_port)
    }
}
