//! Loading `berth.yml` and related project facts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::schema::BerthConfig;
use crate::environment::EnvLookup;
use crate::error::{BerthError, Result};

/// Config file name, at the project root.
pub const CONFIG_FILE: &str = "berth.yml";

/// Overrides the project name derived from the directory.
pub const PROJECT_NAME_VAR: &str = "BERTH_PROJECT_NAME";

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE)
}

/// Parse config YAML. An empty document yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<BerthConfig> {
    if content.trim().is_empty() {
        return Ok(BerthConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| BerthError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load `berth.yml`, writing the default file first if it does not exist.
pub fn load_or_create(project_root: &Path) -> Result<BerthConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        let config = BerthConfig::default();
        let content = serde_yaml::to_string(&config)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
        fs::write(&path, content)?;
        tracing::debug!("Wrote default config to {}", path.display());
        return Ok(config);
    }
    load(project_root)
}

/// Load `berth.yml` without creating it.
///
/// A missing file means the defaults. A file that cannot be parsed is
/// reported with a warning and the defaults are used instead.
pub fn load(project_root: &Path) -> Result<BerthConfig> {
    let path = config_path(project_root);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BerthConfig::default()),
        Err(e) => return Err(e.into()),
    };
    match parse_config(&content, &path) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("{}. Using default configuration.", e);
            Ok(BerthConfig::default())
        }
    }
}

/// The project name: `BERTH_PROJECT_NAME` when set, else the directory name.
pub fn project_name(project_root: &Path, env_fn: &EnvLookup) -> String {
    if let Ok(name) = env_fn(PROJECT_NAME_VAR) {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}
