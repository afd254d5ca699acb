//! Common utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{ConfigResolver, find_first};
use crate::constants::{LOCAL_CONFIG_CANDIDATES, LOCKFILE_NAME};
use crate::profile::ProfileManager;

/// Per-invocation state shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project the command operates on
    pub project_dir: PathBuf,
    /// Profile given with `--profile`, overriding `OCX_PROFILE` and the marker
    pub profile: Option<String>,
}

impl CommandContext {
    /// Context for `project` (or the project containing the current directory).
    pub fn new(project: Option<PathBuf>, profile: Option<String>) -> Result<Self> {
        let project_dir = match project {
            Some(dir) => dir,
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                find_project_root(&cwd)
            }
        };

        Ok(Self {
            project_dir,
            profile,
        })
    }

    pub fn profiles(&self) -> Result<ProfileManager> {
        ProfileManager::new()
    }

    /// Resolver honoring `--profile`, then `OCX_PROFILE`, then the current marker.
    pub fn config_resolver(&self) -> Result<ConfigResolver> {
        ConfigResolver::create_with_profile(&self.project_dir, self.profile.as_deref())
            .context("Failed to determine the active configuration")
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.project_dir.join(LOCKFILE_NAME)
    }
}

/// Nearest ancestor of `start` holding an OCX config, else `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut current = start;
    loop {
        if find_first(current, LOCAL_CONFIG_CANDIDATES).is_some() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start.to_path_buf(),
        }
    }
}
