//! Include/exclude filtering of project paths.
//!
//! Patterns use glob syntax and are matched against paths relative to the
//! project root with `/` separators. `*` stays within one path component;
//! `**` crosses directories.
//!
//! A path is hidden from the sandbox when the path itself or one of its
//! ancestor directories matches an exclude pattern, unless the path matches
//! an include pattern. Includes therefore re-admit individual paths from an
//! excluded directory:
//!
//! ```rust,no_run
//! use ocx_cli::sandbox::PathFilter;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let filter = PathFilter::new(&[".opencode/**".to_string()], &[".opencode/agent/shared.md".to_string()])?;
//! assert!(filter.is_excluded(Path::new(".opencode/agent/private.md")));
//! assert!(!filter.is_excluded(Path::new(".opencode/agent/shared.md")));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path};
use tracing::trace;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled include and exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    excludes: Vec<Pattern>,
    includes: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(excludes: &[String], includes: &[String]) -> Result<Self> {
        Ok(Self {
            excludes: compile(excludes)?,
            includes: compile(includes)?,
        })
    }

    /// Filter that keeps everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether `relative` should be left out of the sandbox.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let normalized = normalize(relative);
        if normalized.is_empty() {
            return false;
        }

        let excluded = ancestors_and_self(&normalized)
            .any(|candidate| self.excludes.iter().any(|p| p.matches_with(candidate, MATCH_OPTIONS)));
        if !excluded {
            return false;
        }

        let included = self.includes.iter().any(|p| p.matches_with(&normalized, MATCH_OPTIONS));
        if included {
            trace!("Re-admitted by include pattern: {}", normalized);
        }
        !included
    }

    /// Keeps the paths that are not excluded, preserving order.
    pub fn apply<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> Vec<P> {
        paths.into_iter().filter(|p| !self.is_excluded(p.as_ref())).collect()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            let trimmed = p.trim_start_matches("./").trim_end_matches('/');
            Pattern::new(trimmed).with_context(|| format!("Invalid glob pattern: {p}"))
        })
        .collect()
}

/// `a/b/c` with `/` separators, dropping `.` components.
fn normalize(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `a`, `a/b`, `a/b/c` for `a/b/c`.
fn ancestors_and_self(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(|(i, _)| &path[..i]).chain(std::iter::once(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_GHOST_EXCLUDES;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn default_filter() -> PathFilter {
        PathFilter::new(&strings(DEFAULT_GHOST_EXCLUDES), &[]).unwrap()
    }

    #[test]
    fn test_default_excludes() {
        let filter = default_filter();
        for hidden in ["AGENTS.md", "opencode.json", "opencode.jsonc", ".opencode/agent/a.md", "ocx.jsonc"] {
            assert!(filter.is_excluded(Path::new(hidden)), "{hidden} should be hidden");
        }
        for visible in ["src/main.rs", "README.md", "docs/AGENTS.md.bak", "sub/opencode.json"] {
            assert!(!filter.is_excluded(Path::new(visible)), "{visible} should be visible");
        }
    }

    #[test]
    fn test_ancestor_directory_match_excludes_children() {
        let filter = PathFilter::new(&strings(&["secrets"]), &[]).unwrap();
        assert!(filter.is_excluded(Path::new("secrets")));
        assert!(filter.is_excluded(Path::new("secrets/api/key.txt")));
        assert!(!filter.is_excluded(Path::new("not-secrets/key.txt")));
    }

    #[test]
    fn test_include_readmits_path() {
        let filter = PathFilter::new(
            &strings(&[".opencode/**", "docs"]),
            &strings(&[".opencode/agent/shared.md", "docs/public/*.md"]),
        )
        .unwrap();

        assert!(!filter.is_excluded(Path::new(".opencode/agent/shared.md")));
        assert!(filter.is_excluded(Path::new(".opencode/agent/private.md")));
        assert!(!filter.is_excluded(Path::new("docs/public/intro.md")));
        assert!(filter.is_excluded(Path::new("docs/internal/notes.md")));
    }

    #[test]
    fn test_include_alone_excludes_nothing() {
        let filter = PathFilter::new(&[], &strings(&["only/this"])).unwrap();
        assert!(!filter.is_excluded(Path::new("anything/else")));
    }

    #[test]
    fn test_single_star_stays_in_component() {
        let filter = PathFilter::new(&strings(&["*.log"]), &[]).unwrap();
        assert!(filter.is_excluded(Path::new("build.log")));
        assert!(!filter.is_excluded(Path::new("logs/build.log")));

        let filter = PathFilter::new(&strings(&["**/*.log"]), &[]).unwrap();
        assert!(filter.is_excluded(Path::new("logs/deep/build.log")));
    }

    #[test]
    fn test_dot_prefix_and_trailing_slash_normalized() {
        let filter = PathFilter::new(&strings(&["./tmp/"]), &[]).unwrap();
        assert!(filter.is_excluded(Path::new("./tmp/file")));
        assert!(filter.is_excluded(Path::new("tmp")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PathFilter::new(&strings(&["[unclosed"]), &[]).is_err());
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = PathFilter::new(&strings(&["b*"]), &[]).unwrap();
        let kept = filter.apply(vec!["c", "b1", "a", "b2"]);
        assert_eq!(kept, vec!["c", "a"]);
    }
}
