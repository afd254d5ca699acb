//! Symlink farm construction and teardown.
//!
//! A sandbox is a fresh directory `<temp>/ocx-ghost-<uuid>` mirroring the
//! project's directory layout with real directories, where every visible file
//! is a symlink to the absolute path of the original. Writes through a symlink
//! land in the project; files created in the sandbox stay in the sandbox.
//!
//! Removal is two-phase: the root is first renamed to
//! `<root>.removing`, then deleted recursively. A crash between the phases
//! leaves only a `.removing` entry, which [`SymlinkFarm::sweep_orphans`]
//! deletes before the next sandbox is built.

use crate::constants::{REMOVING_SUFFIX, SANDBOX_PREFIX};
use crate::core::OcxError;
use crate::sandbox::{PathFilter, discover_files};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Creates sandboxes under one temp directory.
#[derive(Debug, Clone)]
pub struct SymlinkFarm {
    temp_root: PathBuf,
}

impl Default for SymlinkFarm {
    fn default() -> Self {
        Self::new()
    }
}

impl SymlinkFarm {
    /// Farm rooted at the system temp directory.
    pub fn new() -> Self {
        Self::with_temp_root(std::env::temp_dir())
    }

    pub fn with_temp_root(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Builds a sandbox mirroring `source_dir` minus the paths `filter` excludes.
    ///
    /// Every symlink exists when this returns. On failure whatever was created
    /// is removed and [`OcxError::SandboxCreation`] is returned.
    pub async fn create(&self, source_dir: &Path, filter: &PathFilter) -> Result<PathBuf> {
        let source = source_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve project directory: {}", source_dir.display()))?;

        let files = discover_files(&source).await?;
        let visible = filter.apply(files);
        debug!("Sandboxing {} files from {}", visible.len(), source.display());

        self.create_from(&source, &visible).await
    }

    /// Builds a sandbox linking exactly `files` (relative to the canonical
    /// `source`). Same rollback guarantee as [`Self::create`].
    pub async fn create_from(&self, source: &Path, files: &[PathBuf]) -> Result<PathBuf> {
        let temp_root = self.temp_root.canonicalize().unwrap_or_else(|_| self.temp_root.clone());
        if temp_root.starts_with(source) {
            return Err(OcxError::SandboxCreation {
                reason: format!(
                    "temp directory {} is inside the project {}",
                    temp_root.display(),
                    source.display()
                ),
            }
            .into());
        }

        let sandbox = temp_root.join(format!("{SANDBOX_PREFIX}{}", uuid::Uuid::new_v4()));
        match populate(&sandbox, source, files).await {
            Ok(()) => Ok(sandbox),
            Err(e) => {
                if let Err(cleanup_err) = cleanup(&sandbox).await {
                    warn!("Failed to remove partial sandbox {}: {cleanup_err:#}", sandbox.display());
                }
                Err(OcxError::SandboxCreation {
                    reason: format!("{e:#}"),
                }
                .into())
            }
        }
    }

    /// Deletes leftover `ocx-ghost-*.removing` entries from the temp root.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        sweep_orphans(&self.temp_root).await
    }
}

async fn populate(sandbox: &Path, source: &Path, files: &[PathBuf]) -> Result<()> {
    tokio::fs::create_dir(sandbox)
        .await
        .with_context(|| format!("Failed to create {}", sandbox.display()))?;

    let dirs: BTreeSet<&Path> = files
        .iter()
        .filter_map(|f| f.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    for dir in dirs {
        let target = sandbox.join(dir);
        tokio::fs::create_dir_all(&target)
            .await
            .with_context(|| format!("Failed to create {}", target.display()))?;
    }

    // Every link attempt settles before an error is reported, so rollback
    // never races a link still being created
    join_all(files.iter().map(|relative| async move {
        let original = source.join(relative);
        let link = sandbox.join(relative);
        symlink(&original, &link)
            .await
            .with_context(|| format!("Failed to link {} -> {}", link.display(), original.display()))
    }))
    .await
    .into_iter()
    .collect()
}

#[cfg(unix)]
async fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(original, link).await
}

#[cfg(windows)]
async fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    if tokio::fs::metadata(original).await.is_ok_and(|m| m.is_dir()) {
        tokio::fs::symlink_dir(original, link).await
    } else {
        tokio::fs::symlink_file(original, link).await
    }
}

/// `<path>.removing`
pub fn removing_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(REMOVING_SUFFIX);
    PathBuf::from(name)
}

/// Removes a sandbox in two phases. A missing sandbox is not an error.
pub async fn cleanup(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || cleanup_blocking(&path))
        .await
        .context("Sandbox cleanup task panicked")?
}

/// Synchronous [`cleanup`], for drop handlers.
pub fn cleanup_blocking(path: &Path) -> Result<()> {
    let removing = removing_path(path);

    // A previous attempt may have stopped after renaming
    remove_entry(&removing)?;

    match std::fs::rename(path, &removing) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to rename {}", path.display()));
        }
    }

    remove_entry(&removing)?;
    debug!("Removed sandbox {}", path.display());
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    let result = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Deletes entries of `dir` named `ocx-ghost-*.removing`. Returns how many.
///
/// Individual failures are logged and skipped.
pub async fn sweep_orphans(dir: &Path) -> Result<usize> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut swept = 0;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", dir.display()));
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_orphan_name(name) {
                continue;
            }
            match remove_entry(&entry.path()) {
                Ok(()) => swept += 1,
                Err(e) => warn!("Failed to sweep {}: {e:#}", entry.path().display()),
            }
        }

        if swept > 0 {
            debug!("Swept {} orphaned sandbox(es) from {}", swept, dir.display());
        }
        Ok(swept)
    })
    .await
    .context("Sandbox sweep task panicked")?
}

fn is_orphan_name(name: &str) -> bool {
    name.starts_with(SANDBOX_PREFIX) && name.ends_with(REMOVING_SUFFIX)
}
