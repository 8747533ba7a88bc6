//! Release and one-off branch commands.

use super::helpers::load_deploy_config;
use crate::build::NpmBuildService;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::git::GitCli;
use crate::release::ReleaseBranchManager;

/// Execute create-release command
pub(super) async fn execute_create_release(
    repo: &str,
    branch: &str,
    brands: &[String],
    message: Option<&str>,
    config: &RuntimeConfig,
) -> Result<()> {
    let deploy_config = load_deploy_config(config)?;
    let git = GitCli::new(&deploy_config.root);
    let build = NpmBuildService::new(&deploy_config.root);
    let manager = ReleaseBranchManager::new(&deploy_config, &git, &build);

    let _ = config
        .output()
        .section(&format!("Creating release branch {} of {}", branch, repo));

    let created = manager.create_release(repo, branch, brands, message).await?;

    config.success_println(&format!(
        "Created {} at {} (brands: {})",
        created.name,
        created.release_version,
        created.supported_brands.join(",")
    ));
    config.indent(&format!("main is now {}", created.main_version));
    Ok(())
}

/// Execute create-one-off command
pub(super) async fn execute_create_one_off(
    repo: &str,
    branch: &str,
    message: Option<&str>,
    config: &RuntimeConfig,
) -> Result<()> {
    let deploy_config = load_deploy_config(config)?;
    let git = GitCli::new(&deploy_config.root);
    let build = NpmBuildService::new(&deploy_config.root);
    let manager = ReleaseBranchManager::new(&deploy_config, &git, &build);

    let created = manager.create_one_off(repo, branch, message).await?;

    config.success_println(&format!("Created one-off {} at {}", created.name, created.version));
    Ok(())
}
