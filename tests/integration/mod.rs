//! Integration test suite for OCX
//!
//! End-to-end tests driving the `ocx` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **init**: project initialization
//! - **registry**: registry editing in the local and profile scopes
//! - **config**: resolved configuration and provenance
//! - **profile**: profile lifecycle and selection
//! - **ghost**: sandboxed runs and orphan sweeping (unix only)
//! - **errors**: failure rendering and exit codes

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod config;
mod errors;
#[cfg(unix)]
mod ghost;
mod init;
mod profile;
mod registry;
