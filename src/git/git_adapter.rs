//! GitRepository implementation backed by the `git` executable.
//!
//! Repositories are sibling directories of a workspace root, so `repo` names
//! resolve to `{root}/{repo}`.

use crate::error::{GitError, Result};
use crate::git::{CommitInfo, DEFAULT_REMOTE, GitRepository};
use crate::process;
use std::path::{Path, PathBuf};

/// Git operations using the git CLI
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Operate on repositories under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo_dir(&self, repo: &str) -> Result<PathBuf> {
        let dir = self.root.join(repo);
        if !dir.join(".git").exists() {
            return Err(GitError::NotRepository { path: dir }.into());
        }
        Ok(dir)
    }

    async fn git(&self, repo: &str, operation: &str, args: &[&str]) -> Result<String> {
        let dir = self.repo_dir(repo)?;
        let output = process::run("git", args, &dir).await?;
        if !output.success {
            return Err(GitError::CommandFailed {
                repo: repo.to_string(),
                operation: operation.to_string(),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(output.stdout.trim().to_string())
    }

    async fn last_commit(&self, repo: &str) -> Result<CommitInfo> {
        let line = self
            .git(repo, "log", &["log", "-1", "--format=%H%x00%s"])
            .await?;
        let (hash, message) = line.split_once('\0').unwrap_or((line.as_str(), ""));
        Ok(CommitInfo::new(hash, message))
    }
}

impl GitRepository for GitCli {
    async fn is_clean(&self, repo: &str) -> Result<bool> {
        let status = self
            .git(repo, "status", &["status", "--porcelain"])
            .await?;
        Ok(status.is_empty())
    }

    async fn current_branch(&self, repo: &str) -> Result<String> {
        self.git(repo, "rev-parse", &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
    }

    async fn checkout(&self, repo: &str, branch: &str) -> Result<()> {
        log::info!("{}: checkout {}", repo, branch);
        self.git(repo, "checkout", &["checkout", branch]).await?;
        Ok(())
    }

    async fn create_branch(&self, repo: &str, branch: &str) -> Result<()> {
        log::info!("{}: creating branch {}", repo, branch);
        self.git(repo, "checkout", &["checkout", "-b", branch]).await?;
        Ok(())
    }

    async fn commit_all(&self, repo: &str, message: &str) -> Result<CommitInfo> {
        self.git(repo, "add", &["add", "-A"]).await?;
        self.git(repo, "commit", &["commit", "--no-verify", "-m", message])
            .await?;
        let commit = self.last_commit(repo).await?;
        log::info!("{}: committed {} \"{}\"", repo, commit.short_hash, commit.message);
        Ok(commit)
    }

    async fn push(&self, repo: &str, branch: &str) -> Result<()> {
        let dir = self.repo_dir(repo)?;
        let output =
            process::run("git", &["push", "-u", DEFAULT_REMOTE, branch], &dir).await?;
        if !output.success {
            return Err(GitError::PushFailed {
                repo: repo.to_string(),
                branch: branch.to_string(),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }
        log::info!("{}: pushed {} to {}", repo, branch, DEFAULT_REMOTE);
        Ok(())
    }

    async fn remote_branch_exists(&self, repo: &str, branch: &str) -> Result<bool> {
        let refs = self
            .git(
                repo,
                "ls-remote",
                &["ls-remote", "--heads", DEFAULT_REMOTE, branch],
            )
            .await?;
        let expected = format!("refs/heads/{}", branch);
        Ok(refs
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .any(|name| name == expected))
    }

    async fn revert(&self, repo: &str, commit: &str) -> Result<CommitInfo> {
        log::warn!("{}: reverting {}", repo, commit);
        self.git(repo, "revert", &["revert", "--no-edit", commit])
            .await?;
        self.last_commit(repo).await
    }

    async fn head_sha(&self, repo: &str) -> Result<String> {
        self.git(repo, "rev-parse", &["rev-parse", "HEAD"]).await
    }
}
