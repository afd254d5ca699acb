//! Test utilities for OCX
//!
//! Helpers shared by unit tests and the integration suite (enabled through
//! the `test-utils` feature):
//! - [`init_test_logging`] - one-time tracing setup honoring `RUST_LOG`
//! - [`MockRegistry`] - in-memory [`crate::registry::ComponentFetcher`]
//! - [`write_tree`] - lay out a project tree from `(path, content)` pairs

pub mod registry;

pub use registry::MockRegistry;

use anyhow::Result;
use std::path::Path;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Writes each `(relative path, content)` pair under `root`, creating parents.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (path, content) in files {
        crate::utils::safe_write(&root.join(path), content)?;
    }
    Ok(())
}
