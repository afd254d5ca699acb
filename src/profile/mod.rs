//! Named configuration profiles.
//!
//! A profile is a directory under `<config home>/profiles/<name>/` containing
//! an `ocx.jsonc` (registries, ghost include/exclude patterns) and an
//! `opencode.jsonc` (downstream tool settings). At most one profile is active
//! per invocation:
//!
//! 1. an explicit `--profile` flag,
//! 2. else `OCX_PROFILE` when set and non-empty,
//! 3. else the name stored in `<config home>/profiles/current`,
//! 4. else none.
//!
//! An active profile that does not exist on disk is an error rather than a
//! silent fallback to the local scope.

use crate::config::{OcxConfig, config_home, write_config};
use crate::constants::{
    CURRENT_PROFILE_FILE, DEFAULT_GHOST_EXCLUDES, ENV_PROFILE, OCX_CONFIG_FILE,
    OPENCODE_CONFIG_FILE, PROFILES_DIR,
};
use crate::core::OcxError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A profile on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub dir: PathBuf,
}

impl Profile {
    pub fn ocx_config_path(&self) -> PathBuf {
        self.dir.join(OCX_CONFIG_FILE)
    }

    pub fn opencode_config_path(&self) -> PathBuf {
        self.dir.join(OPENCODE_CONFIG_FILE)
    }
}

/// Create/list/remove/select profiles under one root directory.
#[derive(Debug, Clone)]
pub struct ProfileManager {
    root: PathBuf,
}

impl ProfileManager {
    /// Manager for `<config home>/profiles`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(config_home()?.join(PROFILES_DIR)))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Profile names are one path component of ASCII letters, digits, `.`, `_`, `-`.
    pub fn validate_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name != CURRENT_PROFILE_FILE
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(())
        } else {
            Err(OcxError::InvalidProfileName {
                name: name.to_string(),
            }
            .into())
        }
    }

    fn dir_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        Self::validate_name(name).is_ok() && self.dir_of(name).is_dir()
    }

    /// Looks up an existing profile.
    pub fn get(&self, name: &str) -> Result<Profile> {
        Self::validate_name(name)?;
        if !self.exists(name) {
            return Err(OcxError::ProfileNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(Profile {
            name: name.to_string(),
            dir: self.dir_of(name),
        })
    }

    /// Names of all profiles, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read profiles directory: {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && let Some(name) = entry.file_name().to_str()
                && Self::validate_name(name).is_ok()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates a profile with no registries and the default ghost excludes.
    pub fn create(&self, name: &str) -> Result<Profile> {
        Self::validate_name(name)?;
        if self.exists(name) {
            return Err(OcxError::ProfileAlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        let profile = Profile {
            name: name.to_string(),
            dir: self.dir_of(name),
        };
        crate::utils::ensure_dir(&profile.dir)?;

        let config = OcxConfig {
            exclude: DEFAULT_GHOST_EXCLUDES.iter().map(ToString::to_string).collect(),
            ..OcxConfig::default()
        };
        config.save(&profile.ocx_config_path())?;
        write_config(&profile.opencode_config_path(), &serde_json::json!({}))?;

        debug!("Created profile '{}' at {}", name, profile.dir.display());
        Ok(profile)
    }

    /// Deletes a profile; clears the current marker if it pointed at it.
    pub fn remove(&self, name: &str) -> Result<()> {
        let profile = self.get(name)?;
        fs::remove_dir_all(&profile.dir)
            .with_context(|| format!("Failed to remove profile directory: {}", profile.dir.display()))?;

        if self.current()?.as_deref() == Some(name) {
            self.clear_current()?;
        }
        Ok(())
    }

    /// Renames a profile, carrying the current marker along.
    pub fn rename(&self, from: &str, to: &str) -> Result<Profile> {
        let profile = self.get(from)?;
        Self::validate_name(to)?;
        if self.exists(to) {
            return Err(OcxError::ProfileAlreadyExists {
                name: to.to_string(),
            }
            .into());
        }

        let target = self.dir_of(to);
        fs::rename(&profile.dir, &target).with_context(|| {
            format!("Failed to rename {} to {}", profile.dir.display(), target.display())
        })?;

        if self.current()?.as_deref() == Some(from) {
            self.set_current(to)?;
        }
        Ok(Profile {
            name: to.to_string(),
            dir: target,
        })
    }

    /// Name stored in the current-profile marker, if any.
    pub fn current(&self) -> Result<Option<String>> {
        let marker = self.root.join(CURRENT_PROFILE_FILE);
        if !marker.is_file() {
            return Ok(None);
        }
        let name = fs::read_to_string(&marker)
            .with_context(|| format!("Failed to read {}", marker.display()))?;
        let name = name.trim();
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    /// Stores `name` as the current profile. The profile must exist.
    pub fn set_current(&self, name: &str) -> Result<()> {
        self.get(name)?;
        crate::utils::safe_write(&self.root.join(CURRENT_PROFILE_FILE), &format!("{name}\n"))
    }

    pub fn clear_current(&self) -> Result<()> {
        let marker = self.root.join(CURRENT_PROFILE_FILE);
        if marker.exists() {
            fs::remove_file(&marker)
                .with_context(|| format!("Failed to remove {}", marker.display()))?;
        }
        Ok(())
    }

    /// Active profile for this process, reading `OCX_PROFILE` from the environment.
    pub fn active_profile(&self, explicit: Option<&str>) -> Result<Option<Profile>> {
        self.active_profile_with_env(explicit, std::env::var(ENV_PROFILE).ok())
    }

    /// Active profile given an explicit flag and the value of `OCX_PROFILE`.
    pub fn active_profile_with_env(
        &self,
        explicit: Option<&str>,
        env_value: Option<String>,
    ) -> Result<Option<Profile>> {
        let selected = explicit
            .map(ToString::to_string)
            .or_else(|| env_value.filter(|v| !v.trim().is_empty()).map(|v| v.trim().to_string()));

        let name = match selected {
            Some(name) => Some(name),
            None => self.current()?,
        };

        name.map(|n| self.get(&n)).transpose()
    }
}
