//! Git queries used by ghost mode.
//!
//! OCX only reads from git: whether a directory is inside a work tree, where
//! that work tree and its metadata live, and which files git considers part of
//! the project. All calls shell out to the system `git` through
//! [`GitCommand`]; a missing `git` binary behaves like "not a repository".

pub mod command_builder;

pub use command_builder::{GitCommand, GitCommandOutput};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Location of the repository containing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepoInfo {
    /// Top level of the work tree
    pub work_tree: PathBuf,
    /// Absolute path of the `.git` directory
    pub git_dir: PathBuf,
}

/// Returns `true` when `dir` is inside a git work tree.
pub async fn is_work_tree(dir: &Path) -> bool {
    GitCommand::is_inside_work_tree()
        .current_dir(dir)
        .execute_stdout()
        .await
        .is_ok_and(|out| out == "true")
}

/// Work tree and git dir for `dir`, or `None` outside a repository.
pub async fn repo_info(dir: &Path) -> Option<GitRepoInfo> {
    if !is_work_tree(dir).await {
        return None;
    }

    let work_tree = GitCommand::show_toplevel().current_dir(dir).execute_stdout().await.ok()?;
    let git_dir = GitCommand::absolute_git_dir().current_dir(dir).execute_stdout().await.ok()?;

    Some(GitRepoInfo {
        work_tree: PathBuf::from(work_tree),
        git_dir: PathBuf::from(git_dir),
    })
}

/// Files git knows about under `dir`, relative to `dir`.
///
/// Includes untracked files that are not ignored.
pub async fn ls_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let output = GitCommand::ls_files().current_dir(dir).with_context("discovery").execute().await?;
    Ok(parse_nul_separated(&output.raw_stdout))
}

/// Splits `-z` output into paths without assuming the names are UTF-8.
fn parse_nul_separated(stdout: &[u8]) -> Vec<PathBuf> {
    stdout.split(|b| *b == 0).filter(|s| !s.is_empty()).map(path_from_bytes).collect()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

// git emits UTF-8 paths on Windows
#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nul_separated() {
        assert_eq!(
            parse_nul_separated(b"a.txt\0dir/b with space.md\0"),
            vec![PathBuf::from("a.txt"), PathBuf::from("dir/b with space.md")]
        );
        assert!(parse_nul_separated(b"").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_keeps_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let paths = parse_nul_separated(b"ok.txt\0caf\xe9.txt\0");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].as_os_str().as_bytes(), b"caf\xe9.txt");
    }

    #[tokio::test]
    async fn test_plain_directory_is_not_a_work_tree() {
        let temp = tempfile::TempDir::new().unwrap();
        // Place a marker so git cannot walk up into an enclosing repository by accident
        std::fs::create_dir(temp.path().join("plain")).unwrap();
        let dir = temp.path().join("plain");

        if !is_work_tree(temp.path()).await {
            assert!(repo_info(&dir).await.is_none());
        }
    }
}
