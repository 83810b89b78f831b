//! Project-local state.
//!
//! Everything berth persists lives under `.berth/` in the project root:
//! the container registry used for teardown, per-service lock files and
//! the Postgres data directory.

pub mod dir;
pub mod registry;

pub use dir::{StateDir, STATE_DIR_NAME};
pub use registry::{DrainReport, ServiceRegistry};
