//! Reading and writing config files.
//!
//! Config files are JSONC: JSON plus `//` and `/* */` comments and trailing
//! commas. They are parsed with `json5`, which accepts both. Files are always
//! written back as plain pretty-printed JSON, so comments do not survive a
//! rewrite.

use crate::core::OcxError;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Reads a config file. A missing file yields `Ok(None)`.
pub fn read_config(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let value = json5::from_str::<Value>(&content).map_err(|e| OcxError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(value))
}

/// Writes `value` as pretty JSON, atomically.
pub fn write_config(path: &Path, value: &Value) -> Result<()> {
    crate::utils::write_json_file(path, value, true)
}
