//! Initialize a project for OCX.
//!
//! Writes `.opencode/ocx.jsonc` with an empty registry table and the JSON
//! schema reference. Refuses to overwrite an existing config unless `--force`
//! is given.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::constants::{INSTALL_DIR, OCX_CONFIG_FILE};
use crate::utils::safe_write;

const TEMPLATE: &str = r#"{
  "$schema": "https://ocx.kdco.dev/schema.json",
  // Registries are queried in this order when installing components.
  // Example: "kdco": { "url": "https://registry.kdco.dev" }
  "registries": {}
}
"#;

/// Create a local OCX config.
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Overwrite an existing config
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let path = ctx.project_dir.join(INSTALL_DIR).join(OCX_CONFIG_FILE);
        if path.exists() && !self.force {
            return Err(anyhow!("Config already exists at {}. Use --force to overwrite", path.display()));
        }

        safe_write(&path, TEMPLATE)?;

        println!("{} Initialized {}", "✓".green(), path.display());
        println!("\n{}", "Next steps:".cyan());
        println!("  Add a registry with {}", "ocx registry add <name> <url>".bright_white());
        println!("  Then install components with {}", "ocx add <component>".bright_white());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcxConfig;
    use tempfile::TempDir;

    fn ctx(temp: &TempDir) -> CommandContext {
        CommandContext {
            project_dir: temp.path().to_path_buf(),
            profile: None,
        }
    }

    #[tokio::test]
    async fn test_init_writes_parseable_template() {
        let temp = TempDir::new().unwrap();
        InitCommand {
            force: false,
        }
        .execute(&ctx(&temp))
        .await
        .unwrap();

        let config = OcxConfig::load(&temp.path().join(".opencode/ocx.jsonc")).unwrap();
        assert!(config.registries.is_empty());
        assert!(config.schema.is_some());
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let context = ctx(&temp);
        InitCommand {
            force: false,
        }
        .execute(&context)
        .await
        .unwrap();

        assert!(
            InitCommand {
                force: false,
            }
            .execute(&context)
            .await
            .is_err()
        );
        assert!(
            InitCommand {
                force: true,
            }
            .execute(&context)
            .await
            .is_ok()
        );
    }
}
