//! Dependency graph recorded during resolution.
//!
//! The resolver already emits components in install order, so this graph is
//! not needed for ordering. It keeps the edges around for display
//! (`ocx add --dry-run`).

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Directed graph of component names; an edge `a → b` means `a` depends on `b`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph if it doesn't already exist.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Direct dependencies of `name`, in the order they were declared.
    pub fn get_direct_deps(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(name) else {
            return Vec::new();
        };
        // petgraph yields neighbors most-recent-edge first
        let mut deps: Vec<String> =
            self.graph.neighbors(idx).map(|n| self.graph[n].clone()).collect();
        deps.reverse();
        deps
    }

    /// Renders the dependency tree below `root`.
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = format!("{root}\n");
        let mut visited = HashSet::from([root.to_string()]);
        let deps = self.get_direct_deps(root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        name: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(name.to_string()) {
            result.push_str(&format!("{prefix}{connector}{name} (*)\n"));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{name}\n"));

        let deps = self.get_direct_deps(name);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
    }
}
