//! Configuration for OCX.
//!
//! Configuration comes from two scopes:
//!
//! - **local**: the project. Its OCX settings live in the first existing file
//!   of [`LOCAL_CONFIG_CANDIDATES`] and its downstream tool settings in
//!   `opencode.jsonc`/`opencode.json` at the project root.
//! - **profile**: a named directory under `<config home>/profiles/` holding an
//!   `ocx.jsonc` and an `opencode.jsonc`. Present only when a profile is active.
//!
//! [`ConfigResolver`] combines them. Registries and include/exclude patterns
//! come from exactly one scope; the downstream tool settings are merged.
//!
//! # OCX config file
//!
//! ```jsonc
//! {
//!   // queried in this order when installing
//!   "registries": {
//!     "kdco": { "url": "https://registry.kdco.dev" }
//!   },
//!   // ghost mode: paths hidden from the sandboxed process
//!   "exclude": ["AGENTS.md", ".opencode/**"],
//!   "include": [".opencode/agent/shared.md"]
//! }
//! ```
//!
//! [`LOCAL_CONFIG_CANDIDATES`]: crate::constants::LOCAL_CONFIG_CANDIDATES

pub mod io;
pub mod merge;
mod resolver;

pub use io::{read_config, write_config};
pub use merge::deep_merge;
pub use resolver::{ConfigResolver, ResolvedConfig, ResolvedWithOrigin};

use crate::constants::ENV_CONFIG_DIR;
use crate::core::OcxError;
use crate::registry::Registries;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "name", rename_all = "lowercase")]
pub enum ConfigScope {
    Local,
    Profile(String),
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Profile(name) => write!(f, "profile:{name}"),
        }
    }
}

/// Contents of an `ocx.jsonc` file.
///
/// Keys OCX does not know about are kept in `other` so rewriting the file
/// (e.g. `ocx registry add`) does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcxConfig {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub registries: Registries,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl OcxConfig {
    /// Loads an OCX config file; a missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self> {
        match read_config(path)? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                OcxError::ConfigParse {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                }
                .into()
            }),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_config(path, &serde_json::to_value(self)?)
    }
}

/// Loads a downstream tool config as an object; missing files yield `{}`.
pub fn load_object(path: &Path) -> Result<Map<String, Value>> {
    match read_config(path)? {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(OcxError::ConfigParse {
            file: path.display().to_string(),
            reason: "expected a JSON object at the top level".to_string(),
        }
        .into()),
        None => Ok(Map::new()),
    }
}

/// Returns the first candidate under `root` that exists.
pub fn find_first(root: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(|c| root.join(c)).find(|p| p.is_file())
}

/// Directory holding OCX's user-level state (profiles, current marker).
///
/// # Location Priority
///
/// 1. `OCX_CONFIG_DIR` environment variable (if set)
/// 2. `<platform config dir>/ocx` (e.g. `~/.config/ocx` on Linux)
pub fn config_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to determine config directory"))?
        .join("ocx"))
}
