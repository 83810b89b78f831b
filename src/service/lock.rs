//! Per-service advisory file lock.
//!
//! Held while a service looks up and creates its container so two berth
//! processes on the same project do not race on the container name. The
//! lock is released when the guard is dropped (closing the file releases
//! the `flock`).

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// An exclusive lock on `<dir>/<service>.lock`.
#[derive(Debug)]
pub struct ServiceLock {
    path: PathBuf,
    _file: File,
}

impl ServiceLock {
    /// Block until the lock for `service` is acquired.
    pub fn acquire(dir: &Path, service: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.lock", service));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        lock_exclusive(&file)?;
        debug!("Acquired {}", path.display());
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().into())
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> Result<()> {
    Ok(())
}
