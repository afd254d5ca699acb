//! Manage global profiles.
//!
//! Profiles live under the OCX config home (`$OCX_CONFIG_DIR`, or
//! `<config dir>/ocx`). Each holds its own `ocx.jsonc` and `opencode.jsonc`.
//!
//! # Examples
//!
//! ```bash
//! ocx profile create work
//! ocx profile use work
//! ocx profile show
//! ocx profile use --clear
//! ```

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use colored::Colorize;

use super::common::CommandContext;
use crate::profile::ProfileManager;

/// Create, switch and inspect profiles.
#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommands,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommands {
    /// Create a profile with default ghost-mode excludes
    Create {
        name: String,
    },
    /// List profiles, marking the current one
    List,
    /// Delete a profile and its configuration
    Remove {
        name: String,
    },
    /// Rename a profile
    Rename {
        from: String,
        to: String,
    },
    /// Make a profile the current one
    Use {
        #[arg(required_unless_present = "clear")]
        name: Option<String>,
        /// Unset the current profile instead
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },
    /// Show the active profile and its configuration
    Show,
}

impl ProfileCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let manager = ctx.profiles()?;
        match self.command {
            ProfileSubcommands::Create {
                name,
            } => {
                let profile = manager.create(&name)?;
                println!("{} Created profile '{}' at {}", "✓".green(), name, profile.dir.display());
            }
            ProfileSubcommands::List => print!("{}", render_list(&manager)?),
            ProfileSubcommands::Remove {
                name,
            } => {
                manager.remove(&name)?;
                println!("{} Removed profile '{}'", "✓".green(), name);
            }
            ProfileSubcommands::Rename {
                from,
                to,
            } => {
                manager.rename(&from, &to)?;
                println!("{} Renamed profile '{}' to '{}'", "✓".green(), from, to);
            }
            ProfileSubcommands::Use {
                name,
                clear,
            } => {
                if clear {
                    manager.clear_current()?;
                    println!("{} Cleared the current profile", "✓".green());
                } else {
                    let name = name.ok_or_else(|| anyhow!("A profile name is required"))?;
                    manager.set_current(&name)?;
                    println!("{} Now using profile '{}'", "✓".green(), name);
                }
            }
            ProfileSubcommands::Show => print!("{}", render_show(&manager, ctx.profile.as_deref())?),
        }
        Ok(())
    }
}

fn render_list(manager: &ProfileManager) -> Result<String> {
    let names = manager.list()?;
    if names.is_empty() {
        return Ok("No profiles. Create one with `ocx profile create <name>`\n".to_string());
    }

    let current = manager.current()?;
    let mut out = String::new();
    for name in names {
        if current.as_deref() == Some(name.as_str()) {
            out.push_str(&format!("* {}\n", name.green()));
        } else {
            out.push_str(&format!("  {name}\n"));
        }
    }
    Ok(out)
}

fn render_show(manager: &ProfileManager, explicit: Option<&str>) -> Result<String> {
    let Some(profile) = manager.active_profile(explicit)? else {
        return Ok("No active profile; the local config is in effect\n".to_string());
    };

    let mut out = format!("Profile: {}\n", profile.name.bright_white());
    out.push_str(&format!("Directory: {}\n", profile.dir.display()));
    for path in [profile.ocx_config_path(), profile.opencode_config_path()] {
        out.push_str(&format!("\n{}\n", path.display().to_string().cyan()));
        match std::fs::read_to_string(&path) {
            Ok(content) => out.push_str(content.trim_end()),
            Err(_) => out.push_str("(missing)"),
        }
        out.push('\n');
    }
    Ok(out)
}
