//! Scope-aware configuration resolution.

use super::merge::{deep_merge, record_origins};
use super::{ConfigScope, OcxConfig, find_first, load_object};
use crate::constants::{INSTALL_DIR, LOCAL_CONFIG_CANDIDATES, LOCAL_OPENCODE_CANDIDATES, OCX_CONFIG_FILE};
use crate::profile::{Profile, ProfileManager};
use crate::registry::Registries;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration in effect for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub registries: Registries,
    pub opencode: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// A resolved config plus the scope each leaf key came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedWithOrigin {
    pub config: ResolvedConfig,
    pub origins: BTreeMap<String, ConfigScope>,
}

/// Combines the local scope with the active profile, if any.
///
/// The resolver reads files on every call so edits between calls are seen.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    project_root: PathBuf,
    profile: Option<Profile>,
}

impl ConfigResolver {
    /// Resolver for `project_root` with the profile selected by the environment.
    pub fn create(project_root: impl Into<PathBuf>) -> Result<Self> {
        Self::create_with_profile(project_root, None)
    }

    /// Like [`create`](Self::create), with an explicit profile taking precedence.
    pub fn create_with_profile(
        project_root: impl Into<PathBuf>,
        explicit: Option<&str>,
    ) -> Result<Self> {
        let profile = ProfileManager::new()?.active_profile(explicit)?;
        Ok(Self::new(project_root, profile))
    }

    pub fn new(project_root: impl Into<PathBuf>, profile: Option<Profile>) -> Self {
        Self {
            project_root: project_root.into(),
            profile,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// The scope that owns registries and patterns.
    pub fn authoritative_scope(&self) -> ConfigScope {
        match &self.profile {
            Some(p) => ConfigScope::Profile(p.name.clone()),
            None => ConfigScope::Local,
        }
    }

    /// OCX config file of the authoritative scope.
    ///
    /// For the local scope this is the first existing candidate, or
    /// `.opencode/ocx.jsonc` when none exists yet.
    pub fn authoritative_config_path(&self) -> PathBuf {
        match &self.profile {
            Some(p) => p.ocx_config_path(),
            None => self.local_config_path(),
        }
    }

    pub fn local_config_path(&self) -> PathBuf {
        find_first(&self.project_root, LOCAL_CONFIG_CANDIDATES)
            .unwrap_or_else(|| self.project_root.join(INSTALL_DIR).join(OCX_CONFIG_FILE))
    }

    /// Local downstream config file; `opencode.jsonc` when none exists yet.
    pub fn local_opencode_path(&self) -> PathBuf {
        find_first(&self.project_root, LOCAL_OPENCODE_CANDIDATES)
            .unwrap_or_else(|| self.project_root.join(LOCAL_OPENCODE_CANDIDATES[0]))
    }

    pub fn resolve(&self) -> Result<ResolvedConfig> {
        Ok(self.resolve_with_origin()?.config)
    }

    pub fn resolve_with_origin(&self) -> Result<ResolvedWithOrigin> {
        let scope = self.authoritative_scope();
        // Only the authoritative scope's OCX config is read at all
        let ocx = OcxConfig::load(&self.authoritative_config_path())?;
        let local_opencode = load_object(&self.local_opencode_path())?;

        let mut origins = BTreeMap::new();
        for name in ocx.registries.names() {
            origins.insert(format!("registries.{name}"), scope.clone());
        }
        if !ocx.include.is_empty() {
            origins.insert("include".to_string(), scope.clone());
        }
        if !ocx.exclude.is_empty() {
            origins.insert("exclude".to_string(), scope.clone());
        }

        let opencode = match &self.profile {
            Some(profile) => {
                let mut merged = load_object(&profile.opencode_config_path())?;
                deep_merge(&mut merged, &local_opencode);
                record_origins(
                    &merged,
                    Some(&local_opencode),
                    &ConfigScope::Local,
                    &scope,
                    "opencode",
                    &mut origins,
                );
                merged
            }
            None => {
                record_origins(
                    &local_opencode,
                    None,
                    &ConfigScope::Local,
                    &ConfigScope::Local,
                    "opencode",
                    &mut origins,
                );
                local_opencode
            }
        };

        debug!(
            "Resolved config: scope={}, {} registries, {} opencode keys",
            scope,
            ocx.registries.len(),
            opencode.len()
        );

        Ok(ResolvedWithOrigin {
            config: ResolvedConfig {
                registries: ocx.registries,
                opencode,
                profile_name: self.profile.as_ref().map(|p| p.name.clone()),
                include: ocx.include,
                exclude: ocx.exclude,
            },
            origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_tree;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        project: PathBuf,
        profiles: ProfileManager,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let profiles = ProfileManager::with_root(temp.path().join("profiles"));
        Fixture {
            _temp: temp,
            project,
            profiles,
        }
    }

    #[test]
    fn test_local_only() {
        let f = fixture();
        write_tree(
            &f.project,
            &[
                (".opencode/ocx.jsonc", r#"{ "registries": { "L": { "url": "https://l" } } }"#),
                ("opencode.jsonc", r#"{ "theme": "dark" }"#),
            ],
        )
        .unwrap();

        let resolved = ConfigResolver::new(&f.project, None).resolve_with_origin().unwrap();

        assert_eq!(resolved.config.profile_name, None);
        assert_eq!(resolved.config.registries.names(), vec!["L"]);
        assert_eq!(resolved.config.opencode["theme"], "dark");
        assert_eq!(resolved.origins["registries.L"], ConfigScope::Local);
        assert_eq!(resolved.origins["opencode.theme"], ConfigScope::Local);
    }

    #[test]
    fn test_profile_registries_are_isolated() {
        let f = fixture();
        write_tree(
            &f.project,
            &[(
                "ocx.jsonc",
                r#"{ "registries": { "L": { "url": "https://l" } }, "exclude": ["local-only"] }"#,
            )],
        )
        .unwrap();
        let profile = f.profiles.create("work").unwrap();
        write_tree(
            &profile.dir,
            &[("ocx.jsonc", r#"{ "registries": { "P": { "url": "https://p" } } }"#)],
        )
        .unwrap();

        let resolved = ConfigResolver::new(&f.project, Some(profile)).resolve_with_origin().unwrap();

        assert_eq!(resolved.config.registries.len(), 1);
        assert_eq!(resolved.config.registries.names(), vec!["P"]);
        assert!(resolved.config.exclude.is_empty());
        assert!(!resolved.origins.contains_key("registries.L"));
        assert_eq!(
            resolved.origins["registries.P"],
            ConfigScope::Profile("work".to_string())
        );
        assert_eq!(resolved.config.profile_name.as_deref(), Some("work"));
    }

    #[test]
    fn test_profile_with_no_registries_is_valid() {
        let f = fixture();
        write_tree(&f.project, &[("ocx.jsonc", r#"{ "registries": { "L": { "url": "https://l" } } }"#)])
            .unwrap();
        let profile = f.profiles.create("empty").unwrap();

        let resolved = ConfigResolver::new(&f.project, Some(profile)).resolve().unwrap();

        assert!(resolved.registries.is_empty());
        assert!(resolved.exclude.contains(&"AGENTS.md".to_string()));
    }

    #[test]
    fn test_opencode_merge_local_wins() {
        let f = fixture();
        write_tree(&f.project, &[("opencode.json", r#"{ "b": 1, "shared": "l" }"#)]).unwrap();
        let profile = f.profiles.create("work").unwrap();
        write_tree(&profile.dir, &[("opencode.jsonc", r#"{ "a": 1, "shared": "p" }"#)]).unwrap();

        let resolved = ConfigResolver::new(&f.project, Some(profile)).resolve_with_origin().unwrap();

        assert_eq!(
            Value::Object(resolved.config.opencode.clone()),
            json!({ "a": 1, "shared": "l", "b": 1 })
        );
        let work = ConfigScope::Profile("work".to_string());
        assert_eq!(resolved.origins["opencode.a"], work);
        assert_eq!(resolved.origins["opencode.b"], ConfigScope::Local);
        assert_eq!(resolved.origins["opencode.shared"], ConfigScope::Local);
    }

    #[test]
    fn test_local_ocx_config_candidate_order() {
        let f = fixture();
        write_tree(
            &f.project,
            &[
                ("ocx.jsonc", r#"{ "registries": { "root": { "url": "https://root" } } }"#),
                (".opencode/ocx.json", r#"{ "registries": { "nested": { "url": "https://n" } } }"#),
            ],
        )
        .unwrap();

        let resolver = ConfigResolver::new(&f.project, None);
        assert!(resolver.authoritative_config_path().ends_with(".opencode/ocx.json"));
        assert_eq!(resolver.resolve().unwrap().registries.names(), vec!["nested"]);
    }

    #[test]
    fn test_resolve_sees_edits_between_calls() {
        let f = fixture();
        let resolver = ConfigResolver::new(&f.project, None);
        assert!(resolver.resolve().unwrap().registries.is_empty());

        write_tree(&f.project, &[("ocx.jsonc", r#"{ "registries": { "L": { "url": "https://l" } } }"#)])
            .unwrap();
        assert_eq!(resolver.resolve().unwrap().registries.len(), 1);
    }

    #[test]
    fn test_authoritative_path_defaults() {
        let f = fixture();
        let resolver = ConfigResolver::new(&f.project, None);
        assert_eq!(resolver.authoritative_config_path(), f.project.join(".opencode/ocx.jsonc"));
        assert_eq!(resolver.local_opencode_path(), f.project.join("opencode.jsonc"));

        let profile = f.profiles.create("work").unwrap();
        let resolver = ConfigResolver::new(&f.project, Some(profile.clone()));
        assert_eq!(resolver.authoritative_config_path(), profile.ocx_config_path());
    }
}
