//! Error types for sim_release operations.
//!
//! Every failure in the deploy pipeline is fail-fast: the first error halts the
//! run. The categories below mirror the situations an operator has to react to
//! differently, and each carries enough context for an actionable message.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sim_release operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for all sim_release operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Malformed version or branch string
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A precondition for the requested operation does not hold
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// The current version does not permit the requested advance
    #[error("Illegal version transition: {0}")]
    Transition(#[from] TransitionError),

    /// The user declined a confirmation gate
    #[error("{0}")]
    Aborted(#[from] AbortedDeployment),

    /// The production build server request failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The build signalled a fatal problem
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A git command failed
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument or subprocess errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Malformed version identifiers and branch names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text does not match `MAJOR.MINOR.MAINTENANCE(-TESTTYPE.TESTNUMBER)?`
    #[error("'{text}' is not a valid version string")]
    Parse {
        /// Offending input
        text: String,
    },

    /// A single field violates its invariant
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name as it appears in the serialized record
        field: &'static str,
        /// Reason for the error
        reason: String,
    },

    /// Branch name is not `MAJOR.MINOR`
    #[error("'{branch}' is not a release branch name: {reason}")]
    InvalidBranch {
        /// Branch name
        branch: String,
        /// Reason for the error
        reason: String,
    },
}

/// Preconditions checked before (and during) a pipeline run
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// Target network (VPN / production host) cannot be reached
    #[error("{target} is not reachable. Are you connected to the right network?")]
    Unreachable {
        /// Host or URL that was checked
        target: String,
    },

    /// Repository has uncommitted changes
    #[error("working tree of '{repo}' is not clean")]
    DirtyWorkingTree {
        /// Repository name
        repo: String,
    },

    /// Repository is checked out on a different branch
    #[error("'{repo}' is on branch '{actual}', expected '{expected}'")]
    WrongBranch {
        /// Repository name
        repo: String,
        /// Branch required by the operation
        expected: String,
        /// Branch currently checked out
        actual: String,
    },

    /// Branch already exists on the remote
    #[error("branch '{branch}' already exists on the remote for '{repo}'")]
    RemoteBranchExists {
        /// Repository name
        repo: String,
        /// Branch name
        branch: String,
    },

    /// Release branch name and package version disagree on major/minor
    #[error("branch '{branch}' does not match version {version}")]
    BranchVersionMismatch {
        /// Branch name
        branch: String,
        /// Version found in package.json
        version: String,
    },

    /// Requested brands are not all declared in package.json
    #[error("brands {requested:?} are not all supported (supported: {supported:?})")]
    UnsupportedBrands {
        /// Brands requested on the command line
        requested: Vec<String>,
        /// Brands declared in package.json
        supported: Vec<String>,
    },

    /// A required asset file is missing
    #[error("missing required asset {path}")]
    MissingAsset {
        /// Expected path
        path: PathBuf,
    },

    /// Dev server already has a directory for this version
    #[error("directory {path} already exists on the dev server")]
    DevDirectoryExists {
        /// Remote directory path
        path: String,
    },

    /// package.json is missing or lacks a required field
    #[error("package.json at {path}: {reason}")]
    PackageJson {
        /// Path to package.json
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// The previous version's test type does not allow the requested advance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot deploy {stage} from version {previous}: {reason}")]
pub struct TransitionError {
    /// Stage that was requested
    pub stage: String,
    /// Version the transition started from
    pub previous: String,
    /// Reason for the error
    pub reason: String,
}

/// The user declined a confirmation gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Aborted deployment: {gate}")]
pub struct AbortedDeployment {
    /// Which gate was declined
    pub gate: String,
}

/// Production build server failures
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Request could not be sent or no response was received
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Endpoint URL
        url: String,
        /// Reason for the error
        reason: String,
    },

    /// Server answered with a status other than 200 or 202
    #[error("{url} responded with HTTP {status}: {body}")]
    Rejected {
        /// Endpoint URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: String,
    },

    /// The configured server URL is malformed
    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl {
        /// Configured URL
        url: String,
        /// Reason for the error
        reason: String,
    },
}

/// Fatal build outcomes
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build output signals a missing phet-io dependency
    #[error("build of '{repo}' is missing a phet-io dependency: {line}")]
    MissingPhetioDependency {
        /// Repository name
        repo: String,
        /// Output line that triggered the failure
        line: String,
    },

    /// Build command exited unsuccessfully
    #[error("build of '{repo}' failed: {reason}")]
    Failed {
        /// Repository name
        repo: String,
        /// Reason for the error
        reason: String,
    },

    /// Build finished but an expected artifact is missing
    #[error("build of '{repo}' did not produce {path}")]
    MissingArtifact {
        /// Repository name
        repo: String,
        /// Expected artifact path
        path: PathBuf,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("'{path}' is not a git repository")]
    NotRepository {
        /// Directory that was expected to hold a repository
        path: PathBuf,
    },

    /// A git command exited unsuccessfully
    #[error("git {operation} failed in '{repo}': {reason}")]
    CommandFailed {
        /// Repository name
        repo: String,
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// Push failed
    #[error("git push of '{branch}' failed in '{repo}': {reason}")]
    PushFailed {
        /// Repository name
        repo: String,
        /// Branch being pushed
        branch: String,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or parsed
    #[error("could not load {path}: {reason}")]
    LoadFailed {
        /// Path to the config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// A setting required by the operation is missing
    #[error("missing setting '{key}' (set it in build-local.json or via {env})")]
    MissingSetting {
        /// JSON key
        key: &'static str,
        /// Environment variable override
        env: &'static str,
    },

    /// Home directory could not be determined
    #[error("could not determine the home directory")]
    NoHomeDirectory,
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Required executable not found on PATH
    #[error("'{program}' was not found on PATH")]
    ProgramNotFound {
        /// Program name
        program: String,
    },
}

impl DeployError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DeployError::Precondition(PreconditionError::DirtyWorkingTree { repo }) => vec![
                format!("Commit or stash pending changes in '{}'", repo),
                format!("Inspect the tree: git -C {} status", repo),
            ],
            DeployError::Precondition(PreconditionError::WrongBranch { repo, expected, .. }) => {
                vec![format!("Check out the branch first: git -C {} checkout {}", repo, expected)]
            }
            DeployError::Precondition(PreconditionError::Unreachable { .. }) => vec![
                "Connect to the VPN and retry".to_string(),
                "Verify devDeployServer / productionServerURL in build-local.json".to_string(),
            ],
            DeployError::Precondition(PreconditionError::DevDirectoryExists { path }) => vec![
                format!("Version directory {} is already deployed", path),
                "Bump the version with another dev deploy instead of overwriting".to_string(),
            ],
            DeployError::Precondition(PreconditionError::UnsupportedBrands { .. }) => vec![
                "Add the brand to phet.supportedBrands in package.json".to_string(),
                "Or deploy only the supported brands".to_string(),
            ],
            DeployError::Transition(_) => vec![
                "Run 'sim_release preview' to see which stage the current version allows".to_string(),
            ],
            DeployError::Network(_) => vec![
                "The build server request is not retried automatically; re-run the deploy".to_string(),
                "Check buildServerAuthorizationCode in build-local.json".to_string(),
            ],
            DeployError::Config(ConfigError::MissingSetting { key, env }) => vec![format!(
                "Add \"{}\" to ~/.phet/build-local.json or export {}",
                key, env
            )],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
