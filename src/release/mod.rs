//! Release branch and one-off branch management.

mod branch_manager;

pub use branch_manager::{OneOffBranch, ReleaseBranch, ReleaseBranchManager, commit_message};
