//! Git operations the deploy pipeline needs.
//!
//! This module defines the GitRepository trait. Every method names the
//! repository it acts on, because a single deploy touches the simulation
//! repository and all of its dependency repositories. The production
//! implementation lives in the git_adapter module; tests supply fakes.

use crate::error::Result;
use std::future::Future;

/// Remote every push goes to
pub const DEFAULT_REMOTE: &str = "origin";

/// Trait defining all Git operations used by deploys and branch creation
pub trait GitRepository {
    /// Check if the working tree has no uncommitted changes
    fn is_clean(&self, repo: &str) -> impl Future<Output = Result<bool>>;

    /// Name of the checked-out branch
    fn current_branch(&self, repo: &str) -> impl Future<Output = Result<String>>;

    /// Check out an existing branch
    fn checkout(&self, repo: &str, branch: &str) -> impl Future<Output = Result<()>>;

    /// Create a branch at HEAD and check it out
    fn create_branch(&self, repo: &str, branch: &str) -> impl Future<Output = Result<()>>;

    /// Stage every change and commit it
    fn commit_all(&self, repo: &str, message: &str) -> impl Future<Output = Result<CommitInfo>>;

    /// Push a branch to the default remote, setting upstream
    fn push(&self, repo: &str, branch: &str) -> impl Future<Output = Result<()>>;

    /// Check if the default remote has a branch with this name
    fn remote_branch_exists(&self, repo: &str, branch: &str) -> impl Future<Output = Result<bool>>;

    /// Create a commit undoing `commit`
    fn revert(&self, repo: &str, commit: &str) -> impl Future<Output = Result<CommitInfo>>;

    /// Full SHA of HEAD
    fn head_sha(&self, repo: &str) -> impl Future<Output = Result<String>>;
}

/// Information about a Git commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit hash (full SHA)
    pub hash: String,
    /// Short commit hash
    pub short_hash: String,
    /// Commit message summary
    pub message: String,
}

impl CommitInfo {
    /// Build from a full hash, deriving the short form
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        let hash = hash.into();
        let short_hash = hash.chars().take(7).collect();
        Self {
            hash,
            short_hash,
            message: message.into(),
        }
    }
}
