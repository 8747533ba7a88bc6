//! Git operations for deploy and release-branch workflows.
//!
//! This module provides the narrow git interface the pipeline consumes and an
//! implementation that drives the git CLI.

mod git_adapter;
mod operations;

pub use git_adapter::GitCli;
pub use operations::{CommitInfo, DEFAULT_REMOTE, GitRepository};
