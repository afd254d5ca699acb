//! Installing resolved components into a project.
//!
//! An install runs in four steps:
//!
//! 1. **Resolve** the requested names and their dependencies
//!    ([`DependencyResolver`]), in install order.
//! 2. **Check** the plan against `ocx.lock`: requested components that are
//!    already installed abort the install unless `force` is set; already
//!    installed dependencies are left alone.
//! 3. **Write** every file of every remaining component under `.opencode/`,
//!    dependencies first, and merge their MCP server definitions into the
//!    `mcp` section of the downstream config.
//! 4. **Record** the installed components and file checksums in `ocx.lock`.
//!
//! # Install locations
//!
//! A file's `target` from the manifest is used as-is (relative to
//! `.opencode/`). Without one, the location follows the component type:
//!
//! | Type      | Location                              |
//! |-----------|---------------------------------------|
//! | `agent`   | `.opencode/agent/<path>`              |
//! | `command` | `.opencode/command/<path>`            |
//! | `plugin`  | `.opencode/plugin/<path>`             |
//! | `skill`   | `.opencode/skill/<component>/<path>`  |
//! | other     | `.opencode/<path>`                    |

use crate::config::{load_object, write_config};
use crate::constants::{INSTALL_DIR, LOCKFILE_NAME};
use crate::core::OcxError;
use crate::lockfile::{LockFile, LockedComponent, LockedFile};
use crate::registry::{ComponentFetcher, ComponentFile, ComponentKind, Registries};
use crate::resolver::{DependencyResolver, ResolvedComponent, ResolvedDependencies, check_conflicts};
use crate::utils::{atomic_write, checksum_bytes};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Key of the MCP server section in the downstream config.
pub const MCP_CONFIG_KEY: &str = "mcp";

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Reinstall components already present in the lockfile
    pub force: bool,
    /// Resolve and check only; write nothing
    pub dry_run: bool,
}

/// Outcome of an install.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Everything the resolver returned, in install order
    pub resolved: ResolvedDependencies,
    /// Components written by this run (or that would be, for a dry run)
    pub installed: Vec<String>,
    /// Already installed components that were left alone
    pub skipped: Vec<String>,
    /// Project-relative paths written
    pub files: Vec<String>,
    /// MCP server names merged into the downstream config
    pub mcp_servers: Vec<String>,
}

/// Installs components from `registries` into one project.
pub struct Installer<'a, F: ComponentFetcher> {
    fetcher: &'a F,
    registries: &'a Registries,
    project_root: PathBuf,
    opencode_config: PathBuf,
}

impl<'a, F: ComponentFetcher> Installer<'a, F> {
    /// `opencode_config` is the file that receives MCP server definitions.
    pub fn new(
        fetcher: &'a F,
        registries: &'a Registries,
        project_root: impl Into<PathBuf>,
        opencode_config: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            registries,
            project_root: project_root.into(),
            opencode_config: opencode_config.into(),
        }
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.project_root.join(LOCKFILE_NAME)
    }

    pub async fn install(&self, requested: &[String], options: InstallOptions) -> Result<InstallReport> {
        let resolved = DependencyResolver::new(self.fetcher, self.registries).resolve(requested).await?;
        let mut lockfile = LockFile::load(&self.lockfile_path())?;

        let installed_names = lockfile.names();
        let conflicts = check_conflicts(&installed_names, requested);
        if !conflicts.is_empty() && !options.force {
            return Err(OcxError::ComponentConflict {
                names: conflicts,
            }
            .into());
        }

        let mut report = InstallReport::default();
        let mut to_install = Vec::new();
        for component in &resolved.components {
            let name = component.name();
            let reinstall = options.force && requested.iter().any(|r| r == name);
            if lockfile.contains(name) && !reinstall {
                report.skipped.push(name.to_string());
            } else {
                to_install.push(component);
            }
        }
        report.installed = to_install.iter().map(|c| c.name().to_string()).collect();

        if options.dry_run {
            report.mcp_servers = resolved.mcp_servers.keys().cloned().collect();
            report.resolved = resolved;
            return Ok(report);
        }

        for component in &to_install {
            let files = self.install_files(component).await?;
            report.files.extend(files.iter().map(|f| f.path.clone()));
            lockfile.insert(
                component.name(),
                LockedComponent {
                    registry: component.registry_name.clone(),
                    base_url: component.base_url.clone(),
                    files,
                    installed_at: Utc::now(),
                },
            );
            info!("Installed {} from {}", component.name(), component.registry_name);
        }

        let mcp: Map<String, Value> = to_install
            .iter()
            .flat_map(|c| c.manifest.mcp_servers.iter())
            .map(|(name, server)| (name.clone(), server.clone()))
            .collect();
        if !mcp.is_empty() {
            self.merge_mcp_servers(&mcp)?;
            report.mcp_servers = mcp.keys().cloned().collect();
        }

        lockfile.save(&self.lockfile_path())?;
        report.resolved = resolved;
        Ok(report)
    }

    async fn install_files(&self, component: &ResolvedComponent) -> Result<Vec<LockedFile>> {
        let name = component.name();
        let contents = try_join_all(component.manifest.files.iter().map(|file| async move {
            let bytes = self
                .fetcher
                .fetch_file(&component.base_url, name, &file.path)
                .await
                .with_context(|| format!("Failed to download {}/{}", name, file.path))?;
            Ok::<_, anyhow::Error>((file, bytes))
        }))
        .await?;

        let mut locked = Vec::with_capacity(contents.len());
        for (file, bytes) in contents {
            let relative = install_target(name, component.manifest.kind, file)?;
            let destination = self.project_root.join(&relative);
            atomic_write(&destination, &bytes)?;
            debug!("Wrote {}", destination.display());

            locked.push(LockedFile {
                path: relative.to_string_lossy().replace('\\', "/"),
                checksum: checksum_bytes(&bytes),
            });
        }
        Ok(locked)
    }

    /// Adds `servers` to the `mcp` object of the downstream config.
    fn merge_mcp_servers(&self, servers: &Map<String, Value>) -> Result<()> {
        let mut config = load_object(&self.opencode_config)?;
        let section = config.entry(MCP_CONFIG_KEY).or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(section) = section else {
            return Err(anyhow!(
                "'{MCP_CONFIG_KEY}' in {} is not an object",
                self.opencode_config.display()
            ));
        };

        for (name, server) in servers {
            if section.insert(name.clone(), server.clone()).is_some() {
                warn!("Replacing MCP server '{}' in {}", name, self.opencode_config.display());
            }
        }

        write_config(&self.opencode_config, &Value::Object(config))
    }
}

/// Project-relative install path for one component file.
pub fn install_target(component: &str, kind: Option<ComponentKind>, file: &ComponentFile) -> Result<PathBuf> {
    let relative = match &file.target {
        Some(target) => PathBuf::from(target),
        None => {
            let base = match kind {
                Some(ComponentKind::Agent) => PathBuf::from("agent"),
                Some(ComponentKind::Command) => PathBuf::from("command"),
                Some(ComponentKind::Plugin) => PathBuf::from("plugin"),
                Some(ComponentKind::Skill) => Path::new("skill").join(component),
                Some(ComponentKind::Mcp | ComponentKind::Other) | None => PathBuf::new(),
            };
            base.join(&file.path)
        }
    };

    let escapes = relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes || relative.as_os_str().is_empty() {
        return Err(anyhow!(
            "Component '{component}' has an invalid file path: {}",
            relative.display()
        ));
    }

    Ok(Path::new(INSTALL_DIR).join(relative))
}
