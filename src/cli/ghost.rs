//! Ghost mode: run a tool against a filtered view of the project.
//!
//! `ocx ghost run` builds a symlink farm of the project in the temp
//! directory, leaving out everything the active scope excludes, and runs the
//! command inside it with the resolved opencode config injected through the
//! environment. The sandbox is removed when the command exits and the
//! command's exit code becomes OCX's.
//!
//! # Examples
//!
//! ```bash
//! ocx ghost run                      # opencode, current profile
//! ocx ghost run --profile work
//! ocx ghost run -- opencode run "fix the tests"
//! ocx ghost sweep
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

use super::common::CommandContext;
use crate::constants::DEFAULT_GHOST_COMMAND;
use crate::sandbox::{GhostSession, SymlinkFarm, locate_command};

/// Run commands in an isolated project view.
#[derive(Args, Debug)]
pub struct GhostCommand {
    #[command(subcommand)]
    command: GhostSubcommands,
}

#[derive(Subcommand, Debug)]
enum GhostSubcommands {
    /// Run a command (default: opencode) inside a fresh sandbox
    Run {
        /// Leave the sandbox in place after the command exits
        #[arg(long)]
        keep_sandbox: bool,

        /// Command and arguments, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Remove sandbox remnants left by interrupted runs
    Sweep,
}

impl GhostCommand {
    /// Returns the exit code OCX should exit with.
    pub async fn execute(self, ctx: &CommandContext) -> Result<i32> {
        match self.command {
            GhostSubcommands::Run {
                keep_sandbox,
                command,
            } => run(ctx, keep_sandbox, command).await,
            GhostSubcommands::Sweep => {
                let removed = SymlinkFarm::new().sweep_orphans().await?;
                println!("{} Removed {} orphaned sandbox(es)", "✓".green(), removed);
                Ok(0)
            }
        }
    }
}

async fn run(ctx: &CommandContext, keep_sandbox: bool, command: Vec<String>) -> Result<i32> {
    let (program, args) = split_command(command);
    let program = locate_command(&program)?;

    let resolver = ctx.config_resolver()?;
    let config = resolver.resolve()?;
    let mut session = GhostSession::new(&ctx.project_dir, config).keep_sandbox(keep_sandbox);
    if let Some(profile) = resolver.profile() {
        info!("Ghost mode with profile '{}'", profile.name);
        session = session.with_profile_dir(&profile.dir);
    }

    session.run(&program, &args).await
}

/// First word is the program; an empty command means the default tool.
fn split_command(mut command: Vec<String>) -> (String, Vec<String>) {
    if command.is_empty() {
        return (DEFAULT_GHOST_COMMAND.to_string(), Vec::new());
    }
    let program = command.remove(0);
    (program, command)
}
