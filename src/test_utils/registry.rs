//! In-memory registry for tests.
//!
//! [`MockRegistry`] implements [`ComponentFetcher`] over a map of registry URL
//! to published components, and records every lookup so tests can assert on
//! first-match behavior.

use crate::registry::{ComponentFetcher, ComponentManifest};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockRegistry {
    manifests: HashMap<String, HashMap<String, ComponentManifest>>,
    files: HashMap<(String, String, String), Vec<u8>>,
    lookups: Mutex<Vec<(String, String)>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `manifest` on the registry at `url`.
    pub fn publish(&mut self, url: &str, manifest: ComponentManifest) -> &mut Self {
        self.manifests.entry(url.to_string()).or_default().insert(manifest.name.clone(), manifest);
        self
    }

    /// Publishes the content of one component file.
    pub fn publish_file(
        &mut self,
        url: &str,
        component: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.files
            .insert((url.to_string(), component.to_string(), path.to_string()), content.into());
        self
    }

    /// Every `(registry_url, component)` manifest lookup, in call order.
    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of manifest lookups made for `name` across all registries.
    pub fn lookup_count(&self, name: &str) -> usize {
        self.lookups().iter().filter(|(_, n)| n == name).count()
    }
}

impl ComponentFetcher for MockRegistry {
    async fn fetch_component(&self, registry_url: &str, name: &str) -> Result<ComponentManifest> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push((registry_url.to_string(), name.to_string()));
        }
        self.manifests
            .get(registry_url)
            .and_then(|components| components.get(name))
            .cloned()
            .ok_or_else(|| anyhow!("{name} not published on {registry_url}"))
    }

    async fn fetch_file(&self, registry_url: &str, component: &str, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(&(registry_url.to_string(), component.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("{component}/{path} not published on {registry_url}"))
    }
}
