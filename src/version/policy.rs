//! Legal version transitions.
//!
//! Pure functions: given the version currently stored in package.json, the
//! stage being deployed and the operator's flags, compute the version the
//! pipeline should write next, or refuse with a [`TransitionError`].

use crate::error::{TransitionError, ValidationError};
use crate::version::VersionIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch that carries dev versions
pub const MAIN_BRANCH: &str = "main";

/// Test type used on `main`
pub const DEV_TEST_TYPE: &str = "dev";

/// Test type used by release candidates
pub const RC_TEST_TYPE: &str = "rc";

/// Deployment target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeployStage {
    /// Developer server
    Dev,
    /// Release-candidate server
    Rc,
    /// Production build server
    Production,
}

impl DeployStage {
    /// Lowercase name used in prompts and requests
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStage::Dev => "dev",
            DeployStage::Rc => "rc",
            DeployStage::Production => "production",
        }
    }

    /// Whether this stage deploys from a `MAJOR.MINOR` release branch
    pub fn uses_release_branch(&self) -> bool {
        !matches!(self, DeployStage::Dev)
    }
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator flags that influence transitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionFlags {
    /// Re-deploy an already published production version
    pub redeploy: bool,
    /// Skip interactive confirmation gates
    pub noninteractive: bool,
}

/// Result of a transition computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Version to deploy
    pub version: VersionIdentifier,
    /// Whether package.json has to change
    pub version_changed: bool,
}

/// Versions produced when cutting a release branch from `main`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCut {
    /// First version of the new release branch (`rc.0`)
    pub release_version: VersionIdentifier,
    /// Version `main` advances to (`minor + 1`, `dev.0`)
    pub main_version: VersionIdentifier,
}

/// Test type a dev deploy on `branch` must start from.
pub fn expected_dev_test_type(branch: &str) -> &str {
    if branch == MAIN_BRANCH {
        DEV_TEST_TYPE
    } else {
        branch
    }
}

/// Compute the next legal version for `stage`.
///
/// `branch` only matters for dev deploys, where it selects between `dev`
/// (on `main`) and a one-off test type (any other branch).
pub fn propose(
    previous: &VersionIdentifier,
    stage: DeployStage,
    branch: &str,
    flags: TransitionFlags,
) -> Result<Proposal, TransitionError> {
    let refuse = |reason: String| TransitionError {
        stage: stage.to_string(),
        previous: previous.to_string(),
        reason,
    };

    match stage {
        DeployStage::Dev => {
            let expected = expected_dev_test_type(branch);
            match (previous.test_type(), previous.test_number()) {
                (Some(test_type), Some(test_number)) if test_type == expected => {
                    let test_number = test_number
                        .checked_add(1)
                        .ok_or_else(|| refuse("test number is already at its maximum".to_string()))?;
                    Ok(Proposal {
                        version: with_test(previous, previous.maintenance(), expected, test_number)
                            .map_err(|e| refuse(e.to_string()))?,
                        version_changed: true,
                    })
                }
                (actual, _) => Err(refuse(format!(
                    "expected test type '{}' on branch '{}', found {}",
                    expected,
                    branch,
                    describe(actual)
                ))),
            }
        }
        DeployStage::Rc => match previous.test_type() {
            Some(RC_TEST_TYPE) | None => {
                let maintenance = previous
                    .maintenance()
                    .checked_add(u32::from(previous.test_type().is_none()))
                    .ok_or_else(|| refuse("maintenance number is already at its maximum".to_string()))?;
                let test_number = match previous.test_number() {
                    Some(n) => n
                        .checked_add(1)
                        .ok_or_else(|| refuse("test number is already at its maximum".to_string()))?,
                    None => 1,
                };
                Ok(Proposal {
                    version: with_test(previous, maintenance, RC_TEST_TYPE, test_number)
                        .map_err(|e| refuse(e.to_string()))?,
                    version_changed: true,
                })
            }
            actual => Err(refuse(format!(
                "expected test type 'rc' or none, found {}",
                describe(actual)
            ))),
        },
        DeployStage::Production => match previous.test_type() {
            Some(RC_TEST_TYPE) => Ok(Proposal {
                version: VersionIdentifier::release(
                    previous.major(),
                    previous.minor(),
                    previous.maintenance(),
                ),
                version_changed: true,
            }),
            None if flags.redeploy && flags.noninteractive => Ok(Proposal {
                version: previous.clone(),
                version_changed: false,
            }),
            None => Err(refuse(
                "version is already published; redeploying requires both --redeploy and --noninteractive"
                    .to_string(),
            )),
            actual => Err(refuse(format!(
                "expected test type 'rc', found {}",
                describe(actual)
            ))),
        },
    }
}

/// Versions for a new release branch cut from `main`.
///
/// `branch` is the version implied by the branch name (see
/// [`VersionIdentifier::from_branch`]); only its major and minor are used.
/// Fails when `main` cannot move to the next minor.
pub fn cut_release_branch(branch: &VersionIdentifier) -> Result<ReleaseCut, ValidationError> {
    let next_minor = branch
        .minor()
        .checked_add(1)
        .ok_or_else(|| ValidationError::InvalidBranch {
            branch: format!("{}.{}", branch.major(), branch.minor()),
            reason: "minor version has no successor".to_string(),
        })?;
    Ok(ReleaseCut {
        release_version: test_version(branch.major(), branch.minor(), RC_TEST_TYPE),
        main_version: test_version(branch.major(), next_minor, DEV_TEST_TYPE),
    })
}

/// First version of a one-off branch named `name`, seeded from `current`.
pub fn seed_one_off(
    current: &VersionIdentifier,
    name: &str,
) -> Result<VersionIdentifier, ValidationError> {
    VersionIdentifier::new(current.major(), current.minor(), 0, Some(name), Some(0))
}

fn with_test(
    previous: &VersionIdentifier,
    maintenance: u32,
    test_type: &str,
    test_number: u32,
) -> Result<VersionIdentifier, ValidationError> {
    VersionIdentifier::new(
        previous.major(),
        previous.minor(),
        maintenance,
        Some(test_type),
        Some(test_number),
    )
}

fn test_version(major: u32, minor: u32, test_type: &'static str) -> VersionIdentifier {
    match VersionIdentifier::new(major, minor, 0, Some(test_type), Some(0)) {
        Ok(version) => version,
        // Both built-in test types satisfy the test type grammar.
        Err(_) => VersionIdentifier::release(major, minor, 0),
    }
}

fn describe(test_type: Option<&str>) -> String {
    match test_type {
        Some(test_type) => format!("'{}'", test_type),
        None => "none".to_string(),
    }
}
