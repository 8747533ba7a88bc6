//! Preview command implementation.
//!
//! Shows the version a deploy would write without touching any repository.

use super::helpers::branch_for;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::version::policy::{self, TransitionFlags};
use crate::version::{DeployStage, PackageJson, VersionIdentifier};
use serde::Serialize;

/// Arguments of the preview command
pub(super) struct PreviewOptions<'a> {
    pub repo: &'a str,
    pub stage: DeployStage,
    pub branch: Option<&'a str>,
    pub redeploy: bool,
    pub noninteractive: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionPreview {
    repo: String,
    stage: DeployStage,
    branch: String,
    previous_version: VersionIdentifier,
    proposed_version: VersionIdentifier,
    version_changed: bool,
}

/// Execute preview command
pub(super) async fn execute_preview(options: &PreviewOptions<'_>, config: &RuntimeConfig) -> Result<()> {
    let branch = branch_for(options.stage, options.branch)?;
    let package = PackageJson::load(&config.root.join(options.repo)).await?;
    let previous = package.version()?;

    let flags = TransitionFlags {
        redeploy: options.redeploy,
        noninteractive: options.noninteractive,
    };
    let proposal = policy::propose(&previous, options.stage, &branch, flags)?;

    let preview = VersionPreview {
        repo: options.repo.to_string(),
        stage: options.stage,
        branch,
        previous_version: previous,
        proposed_version: proposal.version,
        version_changed: proposal.version_changed,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        let _ = config.output().info(&format!(
            "{} {} on {}: {} → {}{}",
            preview.repo,
            preview.stage,
            preview.branch,
            preview.previous_version,
            preview.proposed_version,
            if preview.version_changed { "" } else { " (redeploy, unchanged)" }
        ));
    }
    Ok(())
}
