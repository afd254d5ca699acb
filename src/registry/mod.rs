//! Registries and component manifests.
//!
//! A registry is a named HTTP endpoint that serves component manifests. Any
//! number of registries may be configured per scope; they are kept in the
//! order they appear in the config file because the dependency resolver
//! queries them in that order and takes the first answer.
//!
//! Registries are written as a JSON object keyed by name:
//!
//! ```json
//! {
//!   "registries": {
//!     "kdco": { "url": "https://registry.kdco.dev" },
//!     "team": { "url": "https://ocx.example.com" }
//!   }
//! }
//! ```
//!
//! Fetching is abstracted behind [`ComponentFetcher`]; [`HttpRegistryClient`]
//! is the production implementation.

mod http;

pub use http::HttpRegistryClient;

use anyhow::Result;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::future::Future;

/// A single configured registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Identifier used in config files and lockfile provenance
    pub name: String,
    /// Base URL manifests are fetched from
    pub url: String,
}

impl RegistryConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RegistryEntry {
    url: String,
}

/// Ordered collection of registries, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registries(Vec<RegistryConfig>);

impl Registries {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a registry, replacing an existing one of the same name in place.
    pub fn insert(&mut self, registry: RegistryConfig) {
        if let Some(existing) = self.0.iter_mut().find(|r| r.name == registry.name) {
            *existing = registry;
        } else {
            self.0.push(registry);
        }
    }

    /// Removes a registry by name. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r.name != name);
        self.0.len() != before
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegistryConfig> {
        self.0.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registries in configured order.
    pub fn iter(&self) -> std::slice::Iter<'_, RegistryConfig> {
        self.0.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RegistryConfig> for Registries {
    fn from_iter<I: IntoIterator<Item = RegistryConfig>>(iter: I) -> Self {
        let mut registries = Self::new();
        for registry in iter {
            registries.insert(registry);
        }
        registries
    }
}

impl<'a> IntoIterator for &'a Registries {
    type Item = &'a RegistryConfig;
    type IntoIter = std::slice::Iter<'a, RegistryConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Registries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for registry in &self.0 {
            map.serialize_entry(
                &registry.name,
                &RegistryEntry {
                    url: registry.url.clone(),
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Registries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json is built with `preserve_order`, so this keeps file order.
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut registries = Self::new();
        for (name, value) in raw {
            let entry: RegistryEntry = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("registry '{name}': {e}")))?;
            registries.insert(RegistryConfig::new(name, entry.url));
        }
        Ok(registries)
    }
}

/// Kind of component, used to pick an install location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Agent,
    Skill,
    Plugin,
    Command,
    Mcp,
    #[serde(other)]
    Other,
}

/// A file shipped by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFile {
    /// Path of the file inside the component on the registry
    pub path: String,
    /// Install location relative to the install directory; derived from the
    /// component kind when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Manifest of a component as served by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ComponentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of components this one needs, possibly served by other registries
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// MCP server definitions keyed by server name; values are passed through
    #[serde(default)]
    pub mcp_servers: Map<String, Value>,
    #[serde(default)]
    pub files: Vec<ComponentFile>,
}

impl ComponentManifest {
    /// Manifest with no dependencies, servers or files.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            description: None,
            dependencies: Vec::new(),
            mcp_servers: Map::new(),
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_mcp_server(mut self, name: impl Into<String>, config: Value) -> Self {
        self.mcp_servers.insert(name.into(), config);
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(ComponentFile {
            path: path.into(),
            target: None,
        });
        self
    }
}

/// Source of component manifests and file contents.
///
/// Implementations apply their own timeouts and never retry; any error is
/// treated by callers as "this registry does not have it".
pub trait ComponentFetcher: Sync {
    /// Fetches the manifest of `name` from the registry at `registry_url`.
    fn fetch_component(
        &self,
        registry_url: &str,
        name: &str,
    ) -> impl Future<Output = Result<ComponentManifest>> + Send;

    /// Fetches the raw content of one component file.
    fn fetch_file(
        &self,
        registry_url: &str,
        component: &str,
        path: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
