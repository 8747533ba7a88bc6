//! Per-run deploy state carried between pipeline steps.

use crate::build::BuildOutput;
use crate::git::CommitInfo;
use crate::version::{DeployStage, TransitionFlags, VersionIdentifier};
use serde::Serialize;

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Simulation repository
    pub repo: String,
    /// Target stage
    pub stage: DeployStage,
    /// Branch to deploy from (`main`, a release branch, or a one-off)
    pub branch: String,
    /// Brands to build and deploy
    pub brands: Vec<String>,
    /// Skip confirmation gates, build unminified when `false`
    pub noninteractive: bool,
    /// Re-deploy an already published production version
    pub redeploy: bool,
    /// Appended to the version bump commit message
    pub message: Option<String>,
}

impl DeployRequest {
    /// Flags consulted by the version transition rules
    pub fn flags(&self) -> TransitionFlags {
        TransitionFlags {
            redeploy: self.redeploy,
            noninteractive: self.noninteractive,
        }
    }
}

/// Mutable record of one deploy run
#[derive(Debug, Clone)]
pub struct DeploySession {
    /// The request this run serves
    pub request: DeployRequest,
    /// Version found in package.json during the precheck
    pub previous_version: Option<VersionIdentifier>,
    /// Version the run writes and deploys
    pub proposed_version: Option<VersionIdentifier>,
    /// `false` only for a production redeploy
    pub version_changed: bool,
    /// Repositories recorded in dependencies.json
    pub dependency_repos: Vec<String>,
    /// Commit that wrote the proposed version, reverted on rollback
    pub version_commit: Option<CommitInfo>,
    /// Output of the local build
    pub build: Option<BuildOutput>,
}

impl DeploySession {
    /// Fresh session; nothing computed yet
    pub fn new(request: DeployRequest) -> Self {
        Self {
            request,
            previous_version: None,
            proposed_version: None,
            version_changed: false,
            dependency_repos: Vec::new(),
            version_commit: None,
            build: None,
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    /// Simulation repository
    pub repo: String,
    /// Target stage
    pub stage: DeployStage,
    /// Version before the run
    pub previous_version: VersionIdentifier,
    /// Version deployed
    pub proposed_version: VersionIdentifier,
    /// Whether package.json was changed
    pub version_changed: bool,
    /// States visited, in order
    pub states: Vec<super::DeployState>,
}
