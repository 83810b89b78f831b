//! Framework settings and the patches applied to them.
//!
//! [`FrameworkSettings`] is the live settings map of the web application
//! (for Django, the module-level names of `settings.py`). Configuration
//! stages never write to it directly; they each produce a
//! [`SettingsPatch`] and a single [`FrameworkSettings::apply`] call merges
//! them, warning about any populated key it overwrites.

pub mod patch;

pub use patch::{is_empty_value, MergeWarning, PatchOp, SettingsPatch};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BerthError, Result};

/// A key/value settings map owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameworkSettings {
    values: Map<String, Value>,
}

impl FrameworkSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| BerthError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write as pretty JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize settings: {}", e))?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content + "\n")?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `key` holds a value other than null or an empty string/list/map.
    pub fn is_populated(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !is_empty_value(v))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Merge a patch in place, returning one warning per overwritten key.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Vec<MergeWarning> {
        patch::apply(&mut self.values, patch)
    }
}

impl From<Map<String, Value>> for FrameworkSettings {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
