//! Deploy command implementation.

use super::helpers::{branch_for, load_deploy_config};
use crate::cli::{DeployTarget, RuntimeConfig};
use crate::confirm::StdinConfirmer;
use crate::deploy::{Collaborators, DeployOrchestrator, DeployRequest};
use crate::error::Result;
use crate::build::NpmBuildService;
use crate::git::GitCli;
use crate::server::{HttpBuildServer, SshDevServer};
use crate::version::DeployStage;

/// Execute deploy command
pub(super) async fn execute_deploy(stage: DeployStage, target: &DeployTarget, config: &RuntimeConfig) -> Result<()> {
    let deploy_config = load_deploy_config(config)?;
    let branch = branch_for(stage, target.branch.as_deref())?;

    let collaborators = Collaborators {
        git: GitCli::new(&deploy_config.root),
        build: NpmBuildService::new(&deploy_config.root),
        dev_server: SshDevServer::new(&deploy_config.build_local),
        production: HttpBuildServer::new(&deploy_config.build_local.production_server_url)?,
        confirmer: StdinConfirmer,
    };

    let request = DeployRequest {
        repo: target.repo.clone(),
        stage,
        branch,
        brands: target.brands.clone(),
        noninteractive: target.noninteractive,
        redeploy: target.redeploy,
        message: target.message.clone(),
    };

    let _ = config
        .output()
        .section(&format!("Deploying {} to {}", request.repo, stage));

    if target.redeploy && stage == DeployStage::Production {
        config.warning_println("--redeploy: a published version is rebuilt without a version bump");
    }

    let mut orchestrator = DeployOrchestrator::new(&deploy_config, &collaborators, request);
    let result = orchestrator.run().await;

    let visited: Vec<String> = orchestrator.history().iter().map(ToString::to_string).collect();
    config.verbose_println(&format!("States: {}", visited.join(" → ")));

    let report = result?;
    if report.version_changed {
        config.success_println(&format!(
            "Deployed {} {} (was {}) to {}",
            report.repo, report.proposed_version, report.previous_version, stage
        ));
    } else {
        config.success_println(&format!(
            "Redeployed {} {} to {}",
            report.repo, report.proposed_version, stage
        ));
    }
    Ok(())
}
