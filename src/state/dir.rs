//! The project-local `.berth` directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the state directory under the project root.
pub const STATE_DIR_NAME: &str = ".berth";

const REGISTRY_FILE: &str = "containers";
const PGDATA_DIR: &str = "pgdata";
const LOCKS_DIR: &str = "locks";

/// Local-only state: registry file, lock files and the Postgres data volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Point at `<project_root>/.berth` without touching the filesystem.
    pub fn at(project_root: &Path) -> Self {
        Self {
            root: project_root.join(STATE_DIR_NAME),
        }
    }

    /// Create the directory layout if missing.
    ///
    /// Writes a `.gitignore` that ignores everything inside, so the
    /// directory never ends up in version control.
    pub fn ensure(project_root: &Path) -> Result<Self> {
        let dir = Self::at(project_root);
        fs::create_dir_all(dir.pgdata())?;
        fs::create_dir_all(dir.locks())?;

        let gitignore = dir.root.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, "*\n")?;
        }
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn registry_file(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    pub fn pgdata(&self) -> PathBuf {
        self.root.join(PGDATA_DIR)
    }

    pub fn locks(&self) -> PathBuf {
        self.root.join(LOCKS_DIR)
    }
}
