//! Inspect the resolved configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::common::CommandContext;
use crate::config::ResolvedWithOrigin;

/// Show the configuration in effect for this project.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommands,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the resolved configuration as JSON
    Show {
        /// Also print which scope each key came from
        #[arg(long)]
        origin: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let resolver = ctx.config_resolver()?;
        match self.command {
            ConfigSubcommands::Show {
                origin,
            } => {
                let resolved = resolver.resolve_with_origin()?;
                println!("{}", serde_json::to_string_pretty(&resolved.config)?);
                if origin {
                    print!("{}", render_origins(&resolved));
                }
                Ok(())
            }
        }
    }
}

fn render_origins(resolved: &ResolvedWithOrigin) -> String {
    if resolved.origins.is_empty() {
        return format!("\n{}\n  (none)\n", "Origins:".cyan());
    }
    let width = resolved.origins.keys().map(String::len).max().unwrap_or(0);
    let mut out = format!("\n{}\n", "Origins:".cyan());
    for (key, scope) in &resolved.origins {
        out.push_str(&format!("  {key:<width$}  {scope}\n"));
    }
    out
}
