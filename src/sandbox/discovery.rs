//! Enumerating the files of a project.

use crate::git;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Files under `root`, relative to it, sorted.
///
/// Inside a git work tree the listing comes from git, so ignored files (build
/// output, dependencies) never reach the sandbox. Outside a repository the
/// whole tree is walked without following symlinks; `.git` is skipped.
/// Entries that no longer exist on disk (deleted but still tracked) are
/// dropped.
pub async fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = if git::is_work_tree(root).await {
        let listed = git::ls_files(root).await?;
        debug!("git listed {} files under {}", listed.len(), root.display());
        listed
            .into_iter()
            .filter(|rel| root.join(rel).symlink_metadata().is_ok())
            .collect::<Vec<_>>()
    } else {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk(&root))
            .await
            .context("File discovery task panicked")??
    };

    files.sort();
    files.dedup();
    Ok(files)
}

/// Non-directory entries under `root`, relative to it.
pub fn walk(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry =
            entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    debug!("Walked {} files under {}", files.len(), root.display());
    Ok(files)
}
