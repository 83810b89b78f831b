//! Managed service containers.
//!
//! A [`ManagedService`] takes one dependency from "nothing on this host" to
//! a ready, registered container:
//!
//! 1. ensure the image is present, pulling it if needed
//! 2. find the container by name; create it, restart it, or leave it running
//! 3. poll the readiness probe until it answers or the timeout passes
//! 4. append the container id to the service registry

pub mod lock;
pub mod managed;
pub mod probe;
pub mod retry;
pub mod spec;

pub use lock::ServiceLock;
pub use managed::{ManagedService, ServiceState};
pub use probe::{FnProbe, PostgresProbe, ReadinessProbe, RedisProbe};
pub use retry::{poll_until, PollPolicy, PollTimeout};
pub use spec::{PortMapping, RestartPolicy, ServiceSpec, VolumeMapping};
