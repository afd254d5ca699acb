//! Recursive merge of JSON objects and provenance tracking.

use super::ConfigScope;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Applies `overlay` on top of `base`.
///
/// Keys holding objects on both sides are merged recursively. Any other
/// overlay value (scalar, array, or an object replacing a non-object)
/// replaces the base value wholesale.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_child)), Value::Object(overlay_child)) => {
                deep_merge(base_child, overlay_child);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Records the scope of every leaf of `merged` under `prefix`.
///
/// A leaf is attributed to `overlay_scope` when `overlay` holds a value at the
/// same path, otherwise to `base_scope`. Arrays and empty objects are leaves.
pub fn record_origins(
    merged: &Map<String, Value>,
    overlay: Option<&Map<String, Value>>,
    overlay_scope: &ConfigScope,
    base_scope: &ConfigScope,
    prefix: &str,
    origins: &mut BTreeMap<String, ConfigScope>,
) {
    for (key, value) in merged {
        let path = format!("{prefix}.{key}");
        let overlay_child = overlay.and_then(|o| o.get(key));

        match value {
            Value::Object(children) if !children.is_empty() => {
                record_origins(
                    children,
                    overlay_child.and_then(Value::as_object),
                    overlay_scope,
                    base_scope,
                    &path,
                    origins,
                );
            }
            _ => {
                let scope = if overlay_child.is_some() {
                    overlay_scope
                } else {
                    base_scope
                };
                origins.insert(path, scope.clone());
            }
        }
    }
}
