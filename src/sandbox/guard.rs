//! One-shot ownership of a sandbox directory.

use super::farm::{cleanup, cleanup_blocking};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Removes its sandbox exactly once, whichever exit path gets there first.
///
/// [`cleanup`](Self::cleanup) is the normal path. If the guard is dropped
/// without it (early return, panic unwinding) `Drop` removes the sandbox
/// synchronously. [`keep`](Self::keep) disarms both.
#[derive(Debug)]
pub struct SandboxGuard {
    path: PathBuf,
    done: AtomicBool,
}

impl SandboxGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            done: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` for the first caller only.
    fn claim(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Removes the sandbox. Returns `false` if it was already handled.
    pub async fn cleanup(&self) -> Result<bool> {
        if !self.claim() {
            return Ok(false);
        }
        cleanup(&self.path).await?;
        Ok(true)
    }

    /// Leaves the sandbox on disk.
    pub fn keep(&self) -> bool {
        let claimed = self.claim();
        if claimed {
            info!("Keeping sandbox at {}", self.path.display());
        }
        claimed
    }
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        if self.claim()
            && let Err(e) = cleanup_blocking(&self.path)
        {
            warn!("Failed to remove sandbox {}: {e:#}", self.path.display());
        }
    }
}
