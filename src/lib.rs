//! OCX - component package manager for opencode
//!
//! OCX installs named components (agents, skills, plugins, commands and MCP
//! servers) from HTTP registries into a project, keeps a lockfile of what was
//! installed, and can run opencode in *ghost mode*: inside an ephemeral
//! symlink farm that shows the tool a filtered view of the project, with
//! configuration taken from a global profile.
//!
//! # Architecture
//!
//! - [`resolver`] - dependency resolution in install order with cycle detection
//! - [`config`] - scope-aware configuration (local project vs. global profile)
//! - [`profile`] - global profile storage and selection
//! - [`sandbox`] - symlink farm, two-phase cleanup and sandboxed execution
//! - [`registry`] - registry configuration, component manifests and the HTTP client
//! - [`installer`] - writes component files, merges MCP servers, updates the lockfile
//! - [`lockfile`] - the `ocx.lock` record of installed components
//! - [`git`] - the few git queries ghost mode needs
//!
//! # Scopes
//!
//! Registries and include/exclude patterns come from exactly one scope: the
//! active profile when there is one, otherwise the project. The downstream
//! opencode settings are the one exception and are deep-merged, with the
//! project overriding the profile.

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod resolver;

// Profiles and ghost mode
pub mod git;
pub mod profile;
pub mod sandbox;

// Components
pub mod installer;
pub mod lockfile;
pub mod registry;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
