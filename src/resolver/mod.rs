//! Dependency resolution for component installs.
//!
//! [`DependencyResolver::resolve`] turns a list of requested component names
//! into an install plan: every requested component plus everything it needs,
//! each exactly once, ordered so that a component always comes after its
//! dependencies.
//!
//! # Algorithm
//!
//! Depth-first traversal with an explicit state per name:
//!
//! - *unseen*: not in the state map
//! - [`VisitState::InProgress`]: on the current path, dependencies pending
//! - [`VisitState::Resolved`]: appended to the output
//!
//! The traversal keeps its own frame stack instead of recursing, so graph
//! depth is not bounded by the call stack. A component is appended only after
//! all of its dependencies have been appended, which makes the output order
//! the install order with no separate sort pass. Meeting an in-progress name
//! again is a cycle; the error carries the path from that name back to itself.
//!
//! # Registry lookup
//!
//! Registries are queried one at a time in configured order and the first
//! one that returns a manifest wins. A failed lookup is not an error until
//! every registry has failed.
//!
//! # MCP servers
//!
//! MCP server definitions of all resolved components are aggregated into one
//! map. On a name collision the component resolved later wins and a warning
//! is logged.

pub mod dependency_graph;

pub use dependency_graph::DependencyGraph;

use crate::core::OcxError;
use crate::registry::{ComponentFetcher, ComponentManifest, Registries, RegistryConfig};
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A manifest together with the registry it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    pub manifest: ComponentManifest,
    /// Name of the registry that answered
    pub registry_name: String,
    /// Base URL of that registry, used later to download files
    pub base_url: String,
}

impl ResolvedComponent {
    pub fn name(&self) -> &str {
        &self.manifest.name
    }
}

/// Result of a resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDependencies {
    /// Components in install order (dependencies first)
    pub components: Vec<ResolvedComponent>,
    /// Names in the same order as `components`
    pub install_order: Vec<String>,
    /// MCP servers aggregated from every component
    pub mcp_servers: Map<String, Value>,
    /// Edges discovered during resolution
    pub graph: DependencyGraph,
}

impl ResolvedDependencies {
    pub fn get(&self, name: &str) -> Option<&ResolvedComponent> {
        self.components.iter().find(|c| c.name() == name)
    }
}

/// Per-name traversal state. Absence from the map means unseen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    InProgress,
    Resolved,
}

struct Frame {
    component: ResolvedComponent,
    next_dep: usize,
}

/// Resolves component names against an ordered registry list.
pub struct DependencyResolver<'a, F: ComponentFetcher> {
    fetcher: &'a F,
    registries: &'a Registries,
}

impl<'a, F: ComponentFetcher> DependencyResolver<'a, F> {
    pub const fn new(fetcher: &'a F, registries: &'a Registries) -> Self {
        Self {
            fetcher,
            registries,
        }
    }

    /// Resolves `requested` and all transitive dependencies.
    ///
    /// # Errors
    ///
    /// - [`OcxError::ComponentNotFound`] if any required name is in no registry
    /// - [`OcxError::CircularDependency`] if a requested name reaches a cycle
    pub async fn resolve(&self, requested: &[String]) -> Result<ResolvedDependencies> {
        let mut states: HashMap<String, VisitState> = HashMap::new();
        let mut result = ResolvedDependencies::default();

        for name in requested {
            if states.contains_key(name) {
                continue;
            }
            self.visit(name, &mut states, &mut result).await?;
        }

        debug!(
            "Resolved {} components: {}",
            result.install_order.len(),
            result.install_order.join(", ")
        );
        Ok(result)
    }

    async fn visit(
        &self,
        root: &str,
        states: &mut HashMap<String, VisitState>,
        result: &mut ResolvedDependencies,
    ) -> Result<()> {
        let mut path: Vec<String> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();

        self.enter(root, states, &mut path, &mut frames, result).await?;

        while let Some(frame) = frames.last_mut() {
            if let Some(dep) = frame.component.manifest.dependencies.get(frame.next_dep).cloned() {
                frame.next_dep += 1;
                let parent = frame.component.manifest.name.clone();
                result.graph.add_dependency(&parent, &dep);

                match states.get(&dep).copied() {
                    Some(VisitState::Resolved) => {}
                    Some(VisitState::InProgress) => {
                        // In-progress names are exactly the ones on `path`
                        let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(dep);
                        return Err(OcxError::CircularDependency {
                            path: cycle,
                        }
                        .into());
                    }
                    None => {
                        self.enter(&dep, states, &mut path, &mut frames, result).await?;
                    }
                }
            } else if let Some(done) = frames.pop() {
                path.pop();
                let name = done.component.manifest.name.clone();
                states.insert(name.clone(), VisitState::Resolved);
                Self::aggregate_mcp_servers(&done.component, &mut result.mcp_servers);
                result.install_order.push(name);
                result.components.push(done.component);
            }
        }

        Ok(())
    }

    async fn enter(
        &self,
        name: &str,
        states: &mut HashMap<String, VisitState>,
        path: &mut Vec<String>,
        frames: &mut Vec<Frame>,
        result: &mut ResolvedDependencies,
    ) -> Result<()> {
        states.insert(name.to_string(), VisitState::InProgress);
        path.push(name.to_string());
        result.graph.add_node(name);

        let component = self.lookup(name).await?;
        frames.push(Frame {
            component,
            next_dep: 0,
        });
        Ok(())
    }

    /// First registry (in configured order) that returns a manifest wins.
    async fn lookup(&self, name: &str) -> Result<ResolvedComponent> {
        for registry in self.registries {
            match self.fetcher.fetch_component(&registry.url, name).await {
                Ok(mut manifest) => {
                    if manifest.name != name {
                        warn!(
                            "Registry '{}' returned manifest named '{}' for '{}'",
                            registry.name, manifest.name, name
                        );
                        manifest.name = name.to_string();
                    }
                    debug!("Found '{}' in registry '{}'", name, registry.name);
                    return Ok(Self::resolved(manifest, registry));
                }
                Err(e) => {
                    debug!("Registry '{}' has no '{}': {:#}", registry.name, name, e);
                }
            }
        }

        Err(OcxError::ComponentNotFound {
            name: name.to_string(),
            searched: self.registries.names(),
        }
        .into())
    }

    fn resolved(manifest: ComponentManifest, registry: &RegistryConfig) -> ResolvedComponent {
        ResolvedComponent {
            manifest,
            registry_name: registry.name.clone(),
            base_url: registry.url.clone(),
        }
    }

    fn aggregate_mcp_servers(component: &ResolvedComponent, servers: &mut Map<String, Value>) {
        for (server, config) in &component.manifest.mcp_servers {
            if servers.contains_key(server) {
                warn!(
                    "MCP server '{}' from '{}' replaces an earlier definition",
                    server,
                    component.name()
                );
            }
            servers.insert(server.clone(), config.clone());
        }
    }
}

/// Returns the names of `to_install` that are already in `existing`,
/// in `to_install` order.
#[must_use]
pub fn check_conflicts(existing: &[String], to_install: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    to_install.iter().filter(|name| existing.contains(name.as_str())).cloned().collect()
}
