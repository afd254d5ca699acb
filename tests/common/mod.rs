//! Common test utilities for OCX integration tests
//!
//! Every [`TestProject`] gets its own project directory, OCX config home and
//! temp directory, so tests never see the user's profiles or each other's
//! sandboxes.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated environment for driving the `ocx` binary.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    config_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let config_dir = temp_dir.path().join("config");
        let tmp_dir = temp_dir.path().join("tmp");

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&tmp_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            config_dir,
            tmp_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Value of `OCX_CONFIG_DIR` for commands run by this project
    pub fn config_path(&self) -> &Path {
        &self.config_dir
    }

    /// Temp directory where sandboxes are created
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_dir
    }

    /// Write a file relative to the project root
    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let full = self.project_dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, content).with_context(|| format!("Failed to write {}", full.display()))
    }

    /// `ocx` command running in the project with isolated config and temp dirs
    pub fn ocx(&self) -> Command {
        Command::from_std(self.ocx_process())
    }

    /// Same as [`Self::ocx`], as a plain process for tests that need the
    /// running child (pid, signals)
    pub fn ocx_process(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_ocx"));
        cmd.current_dir(&self.project_dir)
            .env("OCX_CONFIG_DIR", &self.config_dir)
            .env("TMPDIR", &self.tmp_dir)
            .env_remove("OCX_PROFILE")
            .env_remove("RUST_LOG")
            .arg("--no-color");
        cmd
    }

    /// Names of entries in the sandbox temp directory
    pub fn tmp_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.tmp_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
