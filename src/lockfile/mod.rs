//! The `ocx.lock` file: what was installed, from where, with which content.
//!
//! The lockfile sits next to the project and records every installed
//! component with the registry that served it and a checksum per written
//! file. `ocx add` consults it to detect components that are already
//! installed and `ocx list` prints it.
//!
//! # Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "components": {
//!     "code-reviewer": {
//!       "registry": "kdco",
//!       "baseUrl": "https://registry.kdco.dev",
//!       "files": [
//!         { "path": ".opencode/agent/code-reviewer.md", "checksum": "sha256:…" }
//!       ],
//!       "installedAt": "2026-01-01T00:00:00Z"
//!     }
//!   }
//! }
//! ```
//!
//! Components are kept sorted by name so diffs stay small.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::OcxError;

/// Format version written by this build.
pub const LOCKFILE_VERSION: u32 = 1;

/// Contents of `ocx.lock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    pub version: u32,
    #[serde(default)]
    pub components: BTreeMap<String, LockedComponent>,
}

/// One installed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedComponent {
    /// Name of the registry that served the manifest
    pub registry: String,
    pub base_url: String,
    #[serde(default)]
    pub files: Vec<LockedFile>,
    pub installed_at: DateTime<Utc>,
}

/// A file written by an install, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedFile {
    pub path: String,
    /// `sha256:<hex>` of the content as written
    pub checksum: String,
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFile {
    pub fn new() -> Self {
        Self {
            version: LOCKFILE_VERSION,
            components: BTreeMap::new(),
        }
    }

    /// Loads a lockfile; a missing or empty file yields an empty lockfile.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read lockfile: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let lockfile: Self = serde_json::from_str(&content)
            .map_err(|e| OcxError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
            .with_context(|| {
                format!(
                    "Invalid lockfile: {}\n\n\
                    Delete it and reinstall your components to regenerate it",
                    path.display()
                )
            })?;

        if lockfile.version > LOCKFILE_VERSION {
            anyhow::bail!(
                "Lockfile version {} is newer than supported version {LOCKFILE_VERSION}.\n\
                This lockfile was created by a newer version of ocx.",
                lockfile.version
            );
        }

        Ok(lockfile)
    }

    /// Writes the lockfile atomically as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::utils::write_json_file(path, self, true)
            .with_context(|| format!("Failed to write lockfile: {}", path.display()))
    }

    /// Adds or replaces a component entry.
    pub fn insert(&mut self, name: impl Into<String>, component: LockedComponent) {
        self.components.insert(name.into(), component);
    }

    pub fn get(&self, name: &str) -> Option<&LockedComponent> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.components.remove(name).is_some()
    }

    /// Installed component names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LockedComponent)> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
