//! Deploy pipeline states and the transition table between them.

use crate::version::DeployStage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a deploy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployState {
    /// Reachability, clean trees, branch, test type, brands, assets
    Precheck,
    /// Compute the proposed version
    VersionCompute,
    /// First confirmation gate, before any mutation
    Confirm,
    /// Write, commit and push the new version
    VersionCommit,
    /// Refresh npm dependencies of the repo and toolchain
    DependencyInstall,
    /// Build the simulation
    Build,
    /// Second confirmation gate, after the artifact exists (rc/production)
    PostBuildConfirm,
    /// Copy to the dev server or request a build server deploy
    Publish,
    /// Finished successfully
    Done,
    /// Revert the version commit after a post-build decline
    RollbackVersion,
    /// Return the working tree to `main` after an error
    CheckoutMain,
    /// Finished unsuccessfully
    Fail,
}

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work
    Completed,
    /// The user declined a gate
    Declined,
    /// The step returned an error
    Failed,
}

impl DeployState {
    /// `Done` or `Fail`
    pub fn is_terminal(self) -> bool {
        matches!(self, DeployState::Done | DeployState::Fail)
    }

    /// Transition table.
    ///
    /// Any failure leads to `CheckoutMain`, a post-build decline leads to
    /// `RollbackVersion`, and both rollback states end in `Fail`. Dev deploys
    /// skip the post-build gate.
    pub fn next(self, stage: DeployStage, outcome: StepOutcome) -> DeployState {
        use DeployState::*;

        match (self, outcome) {
            (Done, _) | (Fail, _) => self,
            (CheckoutMain, _) => Fail,
            (RollbackVersion, StepOutcome::Completed) => Fail,
            (_, StepOutcome::Failed) => CheckoutMain,
            (PostBuildConfirm, StepOutcome::Declined) => RollbackVersion,
            (_, StepOutcome::Declined) => CheckoutMain,
            (Precheck, StepOutcome::Completed) => VersionCompute,
            (VersionCompute, StepOutcome::Completed) => Confirm,
            (Confirm, StepOutcome::Completed) => VersionCommit,
            (VersionCommit, StepOutcome::Completed) => DependencyInstall,
            (DependencyInstall, StepOutcome::Completed) => Build,
            (Build, StepOutcome::Completed) if stage == DeployStage::Dev => Publish,
            (Build, StepOutcome::Completed) => PostBuildConfirm,
            (PostBuildConfirm, StepOutcome::Completed) => Publish,
            (Publish, StepOutcome::Completed) => Done,
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Precheck => "PRECHECK",
            DeployState::VersionCompute => "VERSION_COMPUTE",
            DeployState::Confirm => "CONFIRM",
            DeployState::VersionCommit => "VERSION_COMMIT",
            DeployState::DependencyInstall => "DEPENDENCY_INSTALL",
            DeployState::Build => "BUILD",
            DeployState::PostBuildConfirm => "POST_BUILD_CONFIRM",
            DeployState::Publish => "PUBLISH",
            DeployState::Done => "DONE",
            DeployState::RollbackVersion => "ROLLBACK_VERSION",
            DeployState::CheckoutMain => "CHECKOUT_MAIN",
            DeployState::Fail => "FAIL",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::DeployState::*;
    use super::*;

    fn walk(stage: DeployStage) -> Vec<DeployState> {
        let mut state = Precheck;
        let mut visited = vec![state];
        while !state.is_terminal() {
            state = state.next(stage, StepOutcome::Completed);
            visited.push(state);
        }
        visited
    }

    #[test]
    fn dev_skips_post_build_gate() {
        assert_eq!(
            walk(DeployStage::Dev),
            vec![Precheck, VersionCompute, Confirm, VersionCommit, DependencyInstall, Build, Publish, Done]
        );
    }

    #[test]
    fn release_stages_visit_post_build_gate() {
        for stage in [DeployStage::Rc, DeployStage::Production] {
            assert_eq!(
                walk(stage),
                vec![
                    Precheck,
                    VersionCompute,
                    Confirm,
                    VersionCommit,
                    DependencyInstall,
                    Build,
                    PostBuildConfirm,
                    Publish,
                    Done
                ]
            );
        }
    }

    #[test]
    fn rollback_edges() {
        let rc = DeployStage::Rc;
        assert_eq!(PostBuildConfirm.next(rc, StepOutcome::Declined), RollbackVersion);
        assert_eq!(RollbackVersion.next(rc, StepOutcome::Completed), Fail);
        assert_eq!(RollbackVersion.next(rc, StepOutcome::Failed), CheckoutMain);
        for state in [Precheck, VersionCompute, Confirm, VersionCommit, DependencyInstall, Build, Publish] {
            assert_eq!(state.next(rc, StepOutcome::Failed), CheckoutMain);
        }
        assert_eq!(CheckoutMain.next(rc, StepOutcome::Completed), Fail);
        assert_eq!(CheckoutMain.next(rc, StepOutcome::Failed), Fail);
        assert_eq!(Fail.next(rc, StepOutcome::Completed), Fail);
    }
}
