//! Record of containers started for this project.
//!
//! The registry is a plain text file with one container id per line.
//! Managed services only ever append to it; `berth stop` drains it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::error::{BerthError, Result};
use crate::runtime::{ContainerRuntime, StopOutcome};

/// Append-only list of container ids, drained on teardown.
#[derive(Debug)]
pub struct ServiceRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// What happened to each registered container during a drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub stopped: Vec<String>,
    /// Already gone when we tried to stop it.
    pub not_found: Vec<String>,
    /// Stop failed; the container may still be running.
    pub failed: Vec<(String, String)>,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.stopped.len() + self.not_found.len() + self.failed.len()
    }
}

impl ServiceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a container id. Ids already present are not written twice.
    ///
    /// Returns whether a line was added.
    pub fn register(&self, container_id: &str) -> Result<bool> {
        let id = container_id.trim();
        if id.is_empty() {
            return Err(anyhow::anyhow!("refusing to register an empty container id").into());
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.entries()?.iter().any(|existing| existing == id) {
            debug!("Container {} already registered", short_id(id));
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", id)?;
        debug!("Registered container {}", short_id(id));
        Ok(true)
    }

    /// Registered ids in append order. A missing file is an empty registry.
    pub fn entries(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stop every registered container, then delete the file.
    ///
    /// Containers that no longer exist are skipped quietly. Other stop
    /// failures are logged and reported but do not keep the file around.
    /// If the runtime itself is unreachable the drain aborts and the file
    /// is left untouched.
    pub fn drain(&self, runtime: &dyn ContainerRuntime) -> Result<DrainReport> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut report = DrainReport::default();

        for id in self.entries()? {
            match runtime.stop_container(&id) {
                Ok(StopOutcome::Stopped) => {
                    info!("Stopped container {}", short_id(&id));
                    report.stopped.push(id);
                }
                Ok(StopOutcome::NotFound) => {
                    debug!("Container {} was already removed", short_id(&id));
                    report.not_found.push(id);
                }
                Err(e @ BerthError::RuntimeUnavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!("Could not stop container {}: {}", short_id(&id), e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(report)
    }
}

/// Docker-style 12 character prefix for logs.
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ContainerStatus, MockRuntime};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn registry(temp: &TempDir) -> ServiceRegistry {
        ServiceRegistry::new(temp.path().join(".berth").join("containers"))
    }

    #[test]
    fn register_appends_lines() {
        let temp = TempDir::new().unwrap();
        let reg = registry(&temp);
        assert!(reg.register("aaa").unwrap());
        assert!(reg.register("bbb").unwrap());

        let content = fs::read_to_string(reg.path()).unwrap();
        assert_eq!(content, "aaa\nbbb\n");
        assert_eq!(reg.entries().unwrap(), vec!["aaa", "bbb"]);
    }

    #[test]
    fn register_skips_duplicates() {
        let temp = TempDir::new().unwrap();
        let reg = registry(&temp);
        assert!(reg.register("aaa").unwrap());
        assert!(!reg.register("aaa").unwrap());
        assert_eq!(reg.entries().unwrap().len(), 1);
    }

    #[test]
    fn register_rejects_empty_id() {
        let temp = TempDir::new().unwrap();
        assert!(registry(&temp).register("  ").is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(registry(&temp).entries().unwrap().is_empty());
    }

    #[test]
    fn concurrent_registers_do_not_interleave() {
        let temp = TempDir::new().unwrap();
        let reg = Arc::new(registry(&temp));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || reg.register(&format!("container-{}", i)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut entries = reg.entries().unwrap();
        entries.sort();
        assert_eq!(entries.len(), 8);
        assert!(entries.iter().all(|e| e.starts_with("container-")));
    }

    #[test]
    fn drain_stops_and_removes_file() {
        let temp = TempDir::new().unwrap();
        let reg = registry(&temp);
        let runtime = MockRuntime::new().with_container("berth_redis", ContainerStatus::Running);
        let id = runtime.container("berth_redis").unwrap().id;
        reg.register(&id).unwrap();
        reg.register("gone-already").unwrap();

        let report = reg.drain(&runtime).unwrap();
        assert_eq!(report.stopped, vec![id]);
        assert_eq!(report.not_found, vec!["gone-already"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.total(), 2);
        assert!(!reg.path().exists());
        assert_eq!(
            runtime.container("berth_redis").unwrap().status,
            ContainerStatus::Exited
        );
    }

    #[test]
    fn drain_with_unavailable_runtime_keeps_file() {
        let temp = TempDir::new().unwrap();
        let reg = registry(&temp);
        reg.register("abc").unwrap();

        let runtime = MockRuntime::new().unavailable();
        assert!(matches!(
            reg.drain(&runtime),
            Err(BerthError::RuntimeUnavailable { .. })
        ));
        assert_eq!(reg.entries().unwrap(), vec!["abc"]);
    }

    #[test]
    fn drain_empty_registry() {
        let temp = TempDir::new().unwrap();
        let report = registry(&temp).drain(&MockRuntime::new()).unwrap();
        assert_eq!(report, DrainReport::default());
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
