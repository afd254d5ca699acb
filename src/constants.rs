//! Global constants used throughout the OCX codebase.
//!
//! This module contains file names, environment variable names, timeouts and
//! naming conventions that are shared across multiple modules. Defining them
//! centrally keeps the on-disk and environment contracts discoverable.

use std::time::Duration;

/// Default timeout for a single registry HTTP request (30 seconds).
///
/// Can be overridden with [`ENV_HTTP_TIMEOUT_SECS`].
pub fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Name of the OCX configuration file inside a scope.
pub const OCX_CONFIG_FILE: &str = "ocx.jsonc";

/// Candidate locations of the local scope's OCX config, relative to the
/// project root. The first existing file wins.
pub const LOCAL_CONFIG_CANDIDATES: &[&str] =
    &[".opencode/ocx.jsonc", ".opencode/ocx.json", "ocx.jsonc", "ocx.json"];

/// Name of the downstream tool configuration file inside a profile directory.
pub const OPENCODE_CONFIG_FILE: &str = "opencode.jsonc";

/// Candidate locations of the local scope's downstream tool config.
pub const LOCAL_OPENCODE_CANDIDATES: &[&str] = &["opencode.jsonc", "opencode.json"];

/// Lockfile name, written next to the local OCX config.
pub const LOCKFILE_NAME: &str = "ocx.lock";

/// Directory (relative to the project root) that installed component files land in.
pub const INSTALL_DIR: &str = ".opencode";

/// Name of the marker file recording the current profile.
pub const CURRENT_PROFILE_FILE: &str = "current";

/// Profile directory name under the OCX config home.
pub const PROFILES_DIR: &str = "profiles";

/// Prefix shared by every sandbox root and its removing sibling.
pub const SANDBOX_PREFIX: &str = "ocx-ghost-";

/// Suffix appended to a sandbox root during phase one of cleanup.
pub const REMOVING_SUFFIX: &str = ".removing";

/// Default program launched by `ocx ghost run` when none is given.
pub const DEFAULT_GHOST_COMMAND: &str = "opencode";

/// Active profile override.
pub const ENV_PROFILE: &str = "OCX_PROFILE";

/// OCX config home override (defaults to `<config dir>/ocx`).
pub const ENV_CONFIG_DIR: &str = "OCX_CONFIG_DIR";

/// HTTP timeout override, in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "OCX_HTTP_TIMEOUT_SECS";

/// Serialized downstream configuration handed to the spawned process.
pub const ENV_OPENCODE_CONFIG_CONTENT: &str = "OPENCODE_CONFIG_CONTENT";

/// Active configuration directory handed to the spawned process.
pub const ENV_OPENCODE_CONFIG_DIR: &str = "OPENCODE_CONFIG_DIR";

/// Git work tree of the original project.
pub const ENV_GIT_WORK_TREE: &str = "GIT_WORK_TREE";

/// Git metadata directory of the original project.
pub const ENV_GIT_DIR: &str = "GIT_DIR";

/// Exclude patterns written into a freshly created profile.
pub const DEFAULT_GHOST_EXCLUDES: &[&str] = &[
    "opencode.json",
    "opencode.jsonc",
    ".opencode/**",
    "AGENTS.md",
    "CLAUDE.md",
    "ocx.json",
    "ocx.jsonc",
];
