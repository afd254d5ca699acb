//! List components recorded in `ocx.lock`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::lockfile::LockFile;

/// List installed components.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Also print the files each component installed
    #[arg(long)]
    files: bool,
}

impl ListCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let lockfile = LockFile::load(&ctx.lockfile_path())?;
        print!("{}", self.render(&lockfile));
        Ok(())
    }

    fn render(&self, lockfile: &LockFile) -> String {
        if lockfile.is_empty() {
            return "No components installed\n".to_string();
        }

        let width = lockfile.names().iter().map(String::len).max().unwrap_or(0);
        let mut out = String::new();
        for (name, component) in lockfile.iter() {
            out.push_str(&format!(
                "{:<width$}  {}  {}\n",
                name.bright_white(),
                component.registry.cyan(),
                component.installed_at.format("%Y-%m-%d").to_string().dimmed(),
            ));
            if self.files {
                for file in &component.files {
                    out.push_str(&format!("    {}\n", file.path));
                }
            }
        }
        out
    }
}
