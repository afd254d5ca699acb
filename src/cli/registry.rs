//! Manage the registries of the active scope.
//!
//! Registries belong to exactly one scope. With a profile active (`--profile`,
//! `OCX_PROFILE` or the current marker) these commands edit the profile's
//! `ocx.jsonc`; otherwise they edit the project's local config.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use colored::Colorize;

use super::common::CommandContext;
use crate::config::{ConfigResolver, OcxConfig};
use crate::registry::RegistryConfig;

/// Add, remove or list registries.
#[derive(Args, Debug)]
pub struct RegistryCommand {
    #[command(subcommand)]
    command: RegistrySubcommands,
}

#[derive(Subcommand, Debug)]
enum RegistrySubcommands {
    /// Add a registry, or change the URL of an existing one
    Add {
        name: String,
        url: String,
    },
    /// Remove a registry
    Remove {
        name: String,
    },
    /// List registries in lookup order
    List,
}

impl RegistryCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let resolver = ctx.config_resolver()?;
        match self.command {
            RegistrySubcommands::Add {
                name,
                url,
            } => add(&resolver, &name, &url),
            RegistrySubcommands::Remove {
                name,
            } => remove(&resolver, &name),
            RegistrySubcommands::List => {
                list(&resolver);
                Ok(())
            }
        }
    }
}

fn add(resolver: &ConfigResolver, name: &str, url: &str) -> Result<()> {
    let trimmed = url.trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!("Registry URL must start with http:// or https://: {url}"));
    }

    let path = resolver.authoritative_config_path();
    let mut config = OcxConfig::load(&path)?;
    let replaced = config.registries.contains(name);
    config.registries.insert(RegistryConfig::new(name, trimmed));
    config.save(&path)?;

    let verb = if replaced { "Updated" } else { "Added" };
    println!("{} {} registry '{}' ({})", "✓".green(), verb, name, resolver.authoritative_scope());
    Ok(())
}

fn remove(resolver: &ConfigResolver, name: &str) -> Result<()> {
    let path = resolver.authoritative_config_path();
    let mut config = OcxConfig::load(&path)?;
    if !config.registries.remove(name) {
        return Err(anyhow!("Registry '{name}' is not configured in {}", resolver.authoritative_scope()));
    }
    config.save(&path)?;
    println!("{} Removed registry '{}'", "✓".green(), name);
    Ok(())
}

fn list(resolver: &ConfigResolver) {
    let path = resolver.authoritative_config_path();
    let config = match OcxConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e:#}", "warning:".yellow());
            return;
        }
    };

    if config.registries.is_empty() {
        println!("No registries configured in {}", resolver.authoritative_scope());
        return;
    }
    println!("Registries ({}):", resolver.authoritative_scope());
    for registry in &config.registries {
        println!("  {}  {}", registry.name.bright_white(), registry.url);
    }
}
