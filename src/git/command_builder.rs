//! Builder for git subprocess invocations.
//!
//! Every git call OCX makes goes through [`GitCommand`] so that working
//! directory handling, timeouts, logging and error mapping are consistent.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::OcxError;

/// Fluent builder for a single git invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use ocx_cli::git::command_builder::GitCommand;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let top = GitCommand::new()
///     .args(["rev-parse", "--show-toplevel"])
///     .current_dir(Path::new("/path/to/repo"))
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 60 seconds
/// - **Working directory**: current process directory
/// - **Environment**: inherited, minus `GIT_DIR`/`GIT_WORK_TREE`
#[derive(Debug, Clone)]
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Duration,
    context: Option<String>,
}

/// Captured output of a successful git invocation.
#[derive(Debug, Clone, Default)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Stdout exactly as git wrote it, for output that may not be UTF-8
    pub raw_stdout: Vec<u8>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout_duration: Duration::from_secs(60),
            context: None,
        }
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs git against `dir` (passed as `-C <dir>`).
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Label included in debug logs.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    /// Executes the command, failing on a non-zero exit status.
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        let mut cmd = Command::new("git");
        cmd.args(&full_args)
            // An inherited GIT_DIR would point every query at some other repository
            .env_remove(crate::constants::ENV_GIT_DIR)
            .env_remove(crate::constants::ENV_GIT_WORK_TREE)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match &self.context {
            Some(ctx) => tracing::debug!(target: "git", "({}) git {}", ctx, full_args.join(" ")),
            None => tracing::debug!(target: "git", "git {}", full_args.join(" ")),
        }

        let duration = self.timeout_duration;
        let output = match timeout(duration, cmd.output()).await {
            Ok(result) => result.context(format!("Failed to execute git {}", full_args.join(" ")))?,
            Err(_) => {
                tracing::warn!(
                    target: "git",
                    "Command timed out after {} seconds: git {}",
                    duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(OcxError::GitCommandError {
                    operation: self.operation(),
                    stderr: format!("timed out after {} seconds", duration.as_secs()),
                }
                .into());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "Command failed with exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
            return Err(OcxError::GitCommandError {
                operation: self.operation(),
                stderr,
            }
            .into());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
            raw_stdout: output.stdout,
        })
    }

    /// Executes the command and returns its trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout.trim().to_string())
    }

    /// `git rev-parse --is-inside-work-tree`
    pub fn is_inside_work_tree() -> Self {
        Self::new().args(["rev-parse", "--is-inside-work-tree"])
    }

    /// `git rev-parse --show-toplevel`
    pub fn show_toplevel() -> Self {
        Self::new().args(["rev-parse", "--show-toplevel"])
    }

    /// `git rev-parse --absolute-git-dir`
    pub fn absolute_git_dir() -> Self {
        Self::new().args(["rev-parse", "--absolute-git-dir"])
    }

    /// Tracked and untracked-but-not-ignored files, NUL separated.
    pub fn ls_files() -> Self {
        Self::new().args(["ls-files", "--cached", "--others", "--exclude-standard", "-z"])
    }
}
