//! Shared helper functions for command execution.

use crate::cli::RuntimeConfig;
use crate::config::{BuildLocal, DeployConfig};
use crate::error::{CliError, Result};
use crate::version::DeployStage;

/// Load build-local.json and combine it with the repository root
pub(super) fn load_deploy_config(config: &RuntimeConfig) -> Result<DeployConfig> {
    let build_local = BuildLocal::load()?;
    config.verbose_println(&format!("Repositories under {}", config.root.display()));
    Ok(DeployConfig::new(config.root.clone(), build_local))
}

/// Branch for `stage`, as a CLI error when it cannot be resolved
pub(super) fn branch_for(stage: DeployStage, branch: Option<&str>) -> Result<String> {
    crate::cli::resolve_branch(stage, branch).map_err(|reason| CliError::InvalidArguments { reason }.into())
}
