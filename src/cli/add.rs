//! Install components and their dependencies into the project.
//!
//! Components are looked up in the registries of the active scope (the
//! profile's when one is active, otherwise the project's), in configured
//! order. MCP servers declared by installed components are merged into the
//! downstream config of that same scope.
//!
//! # Examples
//!
//! ```bash
//! ocx add code-reviewer
//! ocx add code-reviewer test-writer --dry-run
//! ocx add code-reviewer --force
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::config::ConfigResolver;
use crate::installer::{InstallOptions, InstallReport, Installer};
use crate::registry::{ComponentFetcher, HttpRegistryClient};

/// Install components from the configured registries.
#[derive(Args, Debug)]
pub struct AddCommand {
    /// Component names
    #[arg(required = true)]
    components: Vec<String>,

    /// Show the install plan without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Reinstall components that are already installed
    #[arg(short, long)]
    force: bool,
}

impl AddCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let client = HttpRegistryClient::new()?;
        self.execute_with_fetcher(ctx, &client).await
    }

    pub async fn execute_with_fetcher<F: ComponentFetcher>(
        self,
        ctx: &CommandContext,
        fetcher: &F,
    ) -> Result<()> {
        let resolver = ctx.config_resolver()?;
        let config = resolver.resolve()?;

        let installer = Installer::new(
            fetcher,
            &config.registries,
            &ctx.project_dir,
            mcp_target(&resolver),
        );
        let options = InstallOptions {
            force: self.force,
            dry_run: self.dry_run,
        };
        let report = installer.install(&self.components, options).await?;

        if self.dry_run {
            print_plan(&self.components, &report);
        } else {
            print_summary(&report);
        }
        Ok(())
    }
}

/// Downstream config that receives MCP servers: the authoritative scope's.
fn mcp_target(resolver: &ConfigResolver) -> std::path::PathBuf {
    match resolver.profile() {
        Some(profile) => profile.opencode_config_path(),
        None => resolver.local_opencode_path(),
    }
}

fn print_plan(requested: &[String], report: &InstallReport) {
    println!("{}", "Install plan (dry run):".cyan());
    for root in requested {
        print!("{}", report.resolved.graph.to_tree_string(root));
    }
    println!();
    for name in &report.installed {
        let component = report.resolved.get(name);
        let registry = component.map_or("?", |c| c.registry_name.as_str());
        println!("  {} {} {}", "+".green(), name, format!("({registry})").dimmed());
    }
    for name in &report.skipped {
        println!("  {} {} {}", "=".yellow(), name, "(already installed)".dimmed());
    }
    if !report.mcp_servers.is_empty() {
        println!("\nMCP servers: {}", report.mcp_servers.join(", "));
    }
}

fn print_summary(report: &InstallReport) {
    if report.installed.is_empty() {
        println!("{} Nothing to install", "✓".green());
        return;
    }
    for name in &report.installed {
        println!("{} Installed {}", "✓".green(), name.bright_white());
    }
    if !report.skipped.is_empty() {
        println!("  Already installed: {}", report.skipped.join(", ").dimmed());
    }
    if !report.mcp_servers.is_empty() {
        println!("  Configured MCP servers: {}", report.mcp_servers.join(", "));
    }
    println!("  {} files written", report.files.len());
}
