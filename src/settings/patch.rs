//! Settings patches and the merge step that applies them.

use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

/// One write to a settings map.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Replace the value under `key`.
    Set { key: String, value: Value },
    /// Append each value to the list under `key` unless already present.
    Extend { key: String, values: Vec<Value> },
    /// Insert `value` into the list under `key` right after `anchor`, or at
    /// the end when `anchor` is missing. No-op if `value` is already listed.
    InsertAfter {
        key: String,
        value: Value,
        anchor: Value,
    },
}

impl PatchOp {
    pub fn key(&self) -> &str {
        match self {
            PatchOp::Set { key, .. }
            | PatchOp::Extend { key, .. }
            | PatchOp::InsertAfter { key, .. } => key,
        }
    }
}

/// An ordered set of writes produced by one configuration stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    ops: Vec<PatchOp>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn extend<V: Into<Value>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.ops.push(PatchOp::Extend {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn insert_after(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        anchor: impl Into<Value>,
    ) -> Self {
        self.ops.push(PatchOp::InsertAfter {
            key: key.into(),
            value: value.into(),
            anchor: anchor.into(),
        });
        self
    }

    /// Append another patch's writes after this one's.
    pub fn merge(mut self, other: SettingsPatch) -> Self {
        self.ops.extend(other.ops);
        self
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// A populated key was replaced with a different value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    pub key: String,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} was already set and has been overwritten", self.key)
    }
}

/// Whether a value counts as "not set".
///
/// Null, empty strings and empty lists or maps are empty. Booleans and
/// numbers are always meaningful, including `false` and `0`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Apply a patch to a settings map.
///
/// Never fails. Replacing a non-empty value with a different one logs a
/// warning and records it; everything else is silent.
pub fn apply(values: &mut Map<String, Value>, patch: &SettingsPatch) -> Vec<MergeWarning> {
    let mut warnings = Vec::new();

    for op in patch.ops() {
        match op {
            PatchOp::Set { key, value } => {
                set(values, key, value.clone(), &mut warnings);
            }
            PatchOp::Extend { key, values: items } => {
                update_list(values, key, &mut warnings, |list| {
                    for item in items {
                        if !list.contains(item) {
                            list.push(item.clone());
                        }
                    }
                });
            }
            PatchOp::InsertAfter { key, value, anchor } => {
                update_list(values, key, &mut warnings, |list| {
                    if list.contains(value) {
                        return;
                    }
                    match list.iter().position(|v| v == anchor) {
                        Some(i) => list.insert(i + 1, value.clone()),
                        None => list.push(value.clone()),
                    }
                });
            }
        }
    }

    warnings
}

fn set(
    values: &mut Map<String, Value>,
    key: &str,
    value: Value,
    warnings: &mut Vec<MergeWarning>,
) {
    if let Some(existing) = values.get(key) {
        if !is_empty_value(existing) && *existing != value {
            warn!("{} is already set, overwriting it", key);
            warnings.push(MergeWarning {
                key: key.to_string(),
            });
        }
    }
    values.insert(key.to_string(), value);
}

/// Edit the list under `key`, creating it when missing.
///
/// A populated non-list value is replaced and counts as an overwrite.
fn update_list<F>(
    values: &mut Map<String, Value>,
    key: &str,
    warnings: &mut Vec<MergeWarning>,
    edit: F,
) where
    F: FnOnce(&mut Vec<Value>),
{
    let mut list = match values.remove(key) {
        Some(Value::Array(list)) => list,
        Some(other) => {
            if !is_empty_value(&other) {
                warn!("{} is not a list, replacing it", key);
                warnings.push(MergeWarning {
                    key: key.to_string(),
                });
            }
            Vec::new()
        }
        None => Vec::new(),
    };
    edit(&mut list);
    values.insert(key.to_string(), Value::Array(list));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn set_on_absent_key_is_silent() {
        let mut values = Map::new();
        let warnings = apply(&mut values, &SettingsPatch::new().set("DEBUG", false));
        assert!(warnings.is_empty());
        assert_eq!(values["DEBUG"], json!(false));
    }

    #[test]
    fn set_on_empty_value_is_silent() {
        let mut values = map(json!({"SECRET_KEY": "", "DATABASES": {}, "X": null}));
        let patch = SettingsPatch::new()
            .set("SECRET_KEY", "s3cret")
            .set("DATABASES", json!({"default": {}}))
            .set("X", 1);
        assert!(apply(&mut values, &patch).is_empty());
        assert_eq!(values["SECRET_KEY"], json!("s3cret"));
    }

    #[test]
    fn overwrite_emits_exactly_one_warning() {
        let mut values = map(json!({"SECRET_KEY": "old"}));
        let warnings = apply(&mut values, &SettingsPatch::new().set("SECRET_KEY", "new"));
        assert_eq!(
            warnings,
            vec![MergeWarning {
                key: "SECRET_KEY".into()
            }]
        );
        assert_eq!(values["SECRET_KEY"], json!("new"));
    }

    #[test]
    fn same_value_is_not_a_conflict() {
        let mut values = map(json!({"DEBUG": false}));
        assert!(apply(&mut values, &SettingsPatch::new().set("DEBUG", false)).is_empty());
    }

    #[test]
    fn false_counts_as_set() {
        let mut values = map(json!({"DEBUG": true}));
        let warnings = apply(&mut values, &SettingsPatch::new().set("DEBUG", false));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn extend_appends_missing_items_only() {
        let mut values = map(json!({"ALLOWED_HOSTS": ["localhost"]}));
        let patch = SettingsPatch::new().extend("ALLOWED_HOSTS", [".onrender.com", "localhost"]);
        assert!(apply(&mut values, &patch).is_empty());
        assert_eq!(values["ALLOWED_HOSTS"], json!(["localhost", ".onrender.com"]));
    }

    #[test]
    fn extend_creates_list() {
        let mut values = Map::new();
        apply(&mut values, &SettingsPatch::new().extend("ALLOWED_HOSTS", ["a"]));
        assert_eq!(values["ALLOWED_HOSTS"], json!(["a"]));
    }

    #[test]
    fn extend_replaces_scalar_with_warning() {
        let mut values = map(json!({"ALLOWED_HOSTS": "*"}));
        let warnings = apply(&mut values, &SettingsPatch::new().extend("ALLOWED_HOSTS", ["a"]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(values["ALLOWED_HOSTS"], json!(["a"]));
    }

    #[test]
    fn insert_after_anchor() {
        let mut values = map(json!({"MIDDLEWARE": ["security", "sessions"]}));
        let patch = SettingsPatch::new().insert_after("MIDDLEWARE", "whitenoise", "security");
        apply(&mut values, &patch);
        apply(&mut values, &patch);
        assert_eq!(
            values["MIDDLEWARE"],
            json!(["security", "whitenoise", "sessions"])
        );
    }

    #[test]
    fn insert_after_missing_anchor_appends() {
        let mut values = map(json!({"MIDDLEWARE": ["sessions"]}));
        let patch = SettingsPatch::new().insert_after("MIDDLEWARE", "whitenoise", "security");
        apply(&mut values, &patch);
        assert_eq!(values["MIDDLEWARE"], json!(["sessions", "whitenoise"]));
    }

    #[test]
    fn merge_keeps_order() {
        let patch = SettingsPatch::new()
            .set("A", 1)
            .merge(SettingsPatch::new().set("B", 2));
        let keys: Vec<_> = patch.ops().iter().map(PatchOp::key).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("  ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(["x"])));
    }
}
