//! Command-line interface for OCX.
//!
//! Each command lives in its own module with its clap argument struct and an
//! `execute` method taking the shared [`CommandContext`].
//!
//! # Commands
//!
//! ## Project
//! - `init` - write a local `ocx.jsonc`
//! - `add` - install components and their dependencies
//! - `list` - list installed components from `ocx.lock`
//! - `registry` - edit the registries of the active scope
//! - `config` - show the resolved configuration
//!
//! ## Profiles and ghost mode
//! - `profile` - create, switch and inspect global profiles
//! - `ghost` - run a tool in a filtered, ephemeral view of the project
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - no logging at all
//! - `--no-color` - plain output
//! - `--project <dir>` - operate on another project directory
//! - `--profile <name>` - use this profile instead of `OCX_PROFILE` or the current one
//!
//! ```bash
//! ocx init
//! ocx registry add kdco https://registry.kdco.dev
//! ocx add code-reviewer
//! ocx profile create work && ocx profile use work
//! ocx ghost run
//! ```

mod add;
pub mod common;
mod config;
mod ghost;
mod init;
mod list;
mod profile;
mod registry;

pub use common::CommandContext;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ocx",
    about = "OCX - component package manager for opencode",
    version,
    long_about = "OCX installs agents, skills, plugins and MCP servers from registries, \
                  manages global profiles and runs opencode in an isolated ghost-mode sandbox."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Project directory (defaults to the nearest ancestor with an OCX config)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Profile to use for this invocation
    #[arg(long, global = true, value_name = "NAME")]
    profile: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize OCX in the current project
    Init(init::InitCommand),

    /// Install components from registries
    Add(add::AddCommand),

    /// List installed components
    List(list::ListCommand),

    /// Manage registries
    Registry(registry::RegistryCommand),

    /// Inspect the resolved configuration
    Config(config::ConfigCommand),

    /// Manage global profiles
    Profile(profile::ProfileCommand),

    /// Run a command in an isolated view of the project
    Ghost(ghost::GhostCommand),
}

impl Cli {
    /// Log filter implied by the flags; `None` disables logging.
    #[must_use]
    pub fn log_level(&self) -> Option<&'static str> {
        if self.quiet {
            None
        } else if self.verbose {
            Some("debug")
        } else {
            Some("warn")
        }
    }

    #[must_use]
    pub const fn no_color(&self) -> bool {
        self.no_color
    }

    /// Runs the command and returns the process exit code.
    pub async fn execute(self) -> Result<i32> {
        let ctx = CommandContext::new(self.project, self.profile)?;
        match self.command {
            Commands::Init(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::Add(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::List(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::Registry(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::Config(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::Profile(cmd) => cmd.execute(&ctx).await.map(|()| 0),
            Commands::Ghost(cmd) => cmd.execute(&ctx).await,
        }
    }
}
