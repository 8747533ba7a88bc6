//! Deploy pipeline driver.
//!
//! Runs one [`DeploySession`] through the state table in [`DeployState::next`],
//! delegating every side effect to the collaborators. Errors never escape a
//! step directly: they are remembered, the working tree is returned to `main`,
//! and the first error is reported once the run reaches `Fail`.

use super::session::{DeployReport, DeployRequest, DeploySession};
use super::state::{DeployState, StepOutcome};
use crate::build::{self, BuildOptions, BuildService};
use crate::config::DeployConfig;
use crate::confirm::Confirmer;
use crate::dependencies;
use crate::error::{AbortedDeployment, DeployError, PreconditionError, Result};
use crate::git::GitRepository;
use crate::release::commit_message;
use crate::server::{API_VERSION, BuildServerRequest, DevServerClient, ProductionServerClient};
use crate::version::policy::{self, MAIN_BRANCH};
use crate::version::{DeployStage, PackageJson, VersionIdentifier};

const PHET_BRAND: &str = "phet";
const ALL_LOCALES: &str = "*";
const CONFIRM_GATE: &str = "deploy confirmation";
const POST_BUILD_GATE: &str = "post-build confirmation";

/// The services a deploy talks to
#[derive(Debug, Clone)]
pub struct Collaborators<G, B, D, P, C> {
    /// Version control
    pub git: G,
    /// npm and grunt
    pub build: B,
    /// Dev server file operations
    pub dev_server: D,
    /// Production build server
    pub production: P,
    /// Interactive gates
    pub confirmer: C,
}

/// Drives a single deploy from `Precheck` to `Done` or `Fail`
pub struct DeployOrchestrator<'a, G, B, D, P, C> {
    config: &'a DeployConfig,
    collaborators: &'a Collaborators<G, B, D, P, C>,
    session: DeploySession,
    history: Vec<DeployState>,
}

impl<'a, G, B, D, P, C> DeployOrchestrator<'a, G, B, D, P, C>
where
    G: GitRepository,
    B: BuildService,
    D: DevServerClient,
    P: ProductionServerClient,
    C: Confirmer,
{
    /// Orchestrator for one request
    pub fn new(
        config: &'a DeployConfig,
        collaborators: &'a Collaborators<G, B, D, P, C>,
        request: DeployRequest,
    ) -> Self {
        Self {
            config,
            collaborators,
            session: DeploySession::new(request),
            history: Vec::new(),
        }
    }

    /// States visited so far
    pub fn history(&self) -> &[DeployState] {
        &self.history
    }

    /// Current session
    pub fn session(&self) -> &DeploySession {
        &self.session
    }

    /// Run the pipeline to completion.
    ///
    /// On failure the returned error is the one that first sent the run off
    /// the happy path; errors from the rollback steps themselves are logged.
    pub async fn run(&mut self) -> Result<DeployReport> {
        let stage = self.session.request.stage;
        let mut state = DeployState::Precheck;
        let mut failure: Option<DeployError> = None;

        loop {
            self.history.push(state);
            log::debug!("{} {}: entering {}", self.session.request.repo, stage, state);

            match state {
                DeployState::Done => return self.report(),
                DeployState::Fail => {
                    return Err(failure.unwrap_or_else(|| {
                        AbortedDeployment {
                            gate: state.to_string(),
                        }
                        .into()
                    }));
                }
                _ => {}
            }

            let outcome = match self.step(state).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if failure.is_some() {
                        log::error!("{} failed during rollback: {}", state, e);
                    } else {
                        log::error!("{} failed: {}", state, e);
                        failure = Some(e);
                    }
                    StepOutcome::Failed
                }
            };

            if outcome == StepOutcome::Declined && failure.is_none() {
                failure = Some(
                    AbortedDeployment {
                        gate: POST_BUILD_GATE.to_string(),
                    }
                    .into(),
                );
            }

            state = state.next(stage, outcome);
        }
    }

    async fn step(&mut self, state: DeployState) -> Result<StepOutcome> {
        match state {
            DeployState::Precheck => self.precheck().await?,
            DeployState::VersionCompute => self.compute_version()?,
            DeployState::Confirm => self.confirm().await?,
            DeployState::VersionCommit => self.commit_version().await?,
            DeployState::DependencyInstall => self.install_dependencies().await?,
            DeployState::Build => self.build().await?,
            DeployState::PostBuildConfirm => {
                if !self.post_build_confirm().await? {
                    return Ok(StepOutcome::Declined);
                }
            }
            DeployState::Publish => self.publish().await?,
            DeployState::RollbackVersion => self.rollback_version().await?,
            DeployState::CheckoutMain => self.checkout_main().await?,
            DeployState::Done | DeployState::Fail => {}
        }
        Ok(StepOutcome::Completed)
    }

    async fn precheck(&mut self) -> Result<()> {
        let c = self.collaborators;
        let build_local = &self.config.build_local;
        let request = &self.session.request;
        let repo = request.repo.as_str();

        let (reachable, target) = match request.stage {
            DeployStage::Dev | DeployStage::Rc => (
                c.dev_server.is_reachable().await?,
                &build_local.dev_deploy_server,
            ),
            DeployStage::Production => (
                c.production.is_reachable().await?,
                &build_local.production_server_url,
            ),
        };
        if !reachable {
            return Err(PreconditionError::Unreachable {
                target: target.clone(),
            }
            .into());
        }
        if request.stage.uses_release_branch() {
            build_local.authorization_code()?;
        }

        let repo_dir = self.config.repo_dir(repo);
        let package = PackageJson::load(&repo_dir).await?;
        let dependency_repos = dependencies::dependency_repos(self.config, repo, &package);

        for dependency in &dependency_repos {
            if !c.git.is_clean(dependency).await? {
                return Err(PreconditionError::DirtyWorkingTree {
                    repo: dependency.clone(),
                }
                .into());
            }
        }

        let current = c.git.current_branch(repo).await?;
        if current != request.branch {
            return Err(PreconditionError::WrongBranch {
                repo: repo.to_string(),
                expected: request.branch.clone(),
                actual: current,
            }
            .into());
        }

        let previous = package.version()?;
        if request.stage.uses_release_branch() {
            let branch_version = VersionIdentifier::from_branch(&request.branch)?;
            if branch_version.major() != previous.major() || branch_version.minor() != previous.minor() {
                return Err(PreconditionError::BranchVersionMismatch {
                    branch: request.branch.clone(),
                    version: previous.to_string(),
                }
                .into());
            }
        }

        // Test type check; the proposal itself is recomputed in VERSION_COMPUTE.
        policy::propose(&previous, request.stage, &request.branch, request.flags())?;

        let supported = package.supported_brands();
        if request.brands.is_empty() || request.brands.iter().any(|brand| !supported.contains(brand)) {
            return Err(PreconditionError::UnsupportedBrands {
                requested: request.brands.clone(),
                supported,
            }
            .into());
        }

        if request.stage == DeployStage::Production && request.brands.iter().any(|b| b == PHET_BRAND) {
            let screenshot = repo_dir
                .join("assets")
                .join(format!("{}-screenshot.png", repo));
            if !tokio::fs::try_exists(&screenshot).await? {
                return Err(PreconditionError::MissingAsset { path: screenshot }.into());
            }
        }

        log::info!("{}: prechecks passed on {} at {}", repo, request.branch, previous);
        self.session.previous_version = Some(previous);
        self.session.dependency_repos = dependency_repos;
        Ok(())
    }

    fn compute_version(&mut self) -> Result<()> {
        let request = &self.session.request;
        let previous = self.previous()?;
        let proposal = policy::propose(previous, request.stage, &request.branch, request.flags())?;

        log::info!(
            "{}: {} -> {}{}",
            request.repo,
            previous,
            proposal.version,
            if proposal.version_changed { "" } else { " (redeploy)" }
        );
        self.session.proposed_version = Some(proposal.version);
        self.session.version_changed = proposal.version_changed;
        Ok(())
    }

    async fn confirm(&mut self) -> Result<()> {
        let request = &self.session.request;
        if request.noninteractive {
            return Ok(());
        }
        let prompt = format!(
            "Deploy {} {} -> {} to {} (brands: {})?",
            request.repo,
            self.previous()?,
            self.proposed()?,
            request.stage,
            request.brands.join(",")
        );
        if !self.collaborators.confirmer.confirm(&prompt).await? {
            return Err(AbortedDeployment {
                gate: CONFIRM_GATE.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn commit_version(&mut self) -> Result<()> {
        if !self.session.version_changed {
            log::info!("{}: version unchanged, nothing to commit", self.session.request.repo);
            return Ok(());
        }

        let git = &self.collaborators.git;
        let request = &self.session.request;
        let proposed = self.proposed()?;

        let mut package = PackageJson::load(&self.config.repo_dir(&request.repo)).await?;
        package.set_version(proposed);
        if request.stage == DeployStage::Production {
            package.set_published(proposed.is_published());
        }
        package.save().await?;

        let message = commit_message(proposed, request.message.as_deref());
        let commit = git.commit_all(&request.repo, &message).await?;
        git.push(&request.repo, &request.branch).await?;

        log::info!("{}: committed {} ({})", request.repo, proposed, commit.short_hash);
        self.session.version_commit = Some(commit);
        Ok(())
    }

    async fn install_dependencies(&mut self) -> Result<()> {
        let repo = self.session.request.repo.as_str();
        let repos = std::iter::once(repo).chain(self.config.toolchain_repos.iter().map(String::as_str));
        for dependency in repos {
            self.collaborators.build.install_dependencies(dependency).await?;
        }
        Ok(())
    }

    async fn build(&mut self) -> Result<()> {
        let request = &self.session.request;
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let options = BuildOptions {
            brands: request.brands.clone(),
            minify: !request.noninteractive,
            version: self.proposed()?.with_build_timestamp(timestamp),
        };

        let output = self.collaborators.build.build(&request.repo, &options).await?;
        build::check_build_log(&request.repo, &output.log)?;

        self.session.build = Some(output);
        Ok(())
    }

    async fn post_build_confirm(&mut self) -> Result<bool> {
        let request = &self.session.request;
        if request.noninteractive {
            return Ok(true);
        }
        let prompt = format!(
            "Please test the local build of {} {}. Deploy it to {}?",
            request.repo,
            self.proposed()?,
            request.stage
        );
        self.collaborators.confirmer.confirm(&prompt).await
    }

    async fn publish(&mut self) -> Result<()> {
        match self.session.request.stage {
            DeployStage::Dev => self.publish_dev().await,
            DeployStage::Rc | DeployStage::Production => self.request_build_server().await,
        }
    }

    async fn publish_dev(&mut self) -> Result<()> {
        let dev = &self.collaborators.dev_server;
        let build_local = &self.config.build_local;
        let request = &self.session.request;
        let version = self.proposed()?.to_string();
        let artifact_dir = match &self.session.build {
            Some(output) => output.artifact_dir.clone(),
            None => return Err(self.out_of_order(DeployState::Publish)),
        };

        let remote = build_local.dev_version_path(&request.repo, &version);
        if dev.directory_exists(&remote).await? {
            return Err(PreconditionError::DevDirectoryExists { path: remote }.into());
        }
        dev.create_directory(&remote).await?;
        dev.copy_directory(&artifact_dir, &remote).await?;

        for brand in &request.brands {
            log::info!("Deployed: {}", build_local.dev_url(&request.repo, &version, brand));
        }
        Ok(())
    }

    async fn request_build_server(&mut self) -> Result<()> {
        let c = self.collaborators;
        let build_local = &self.config.build_local;
        let request = &self.session.request;
        let version = self.proposed()?;

        let map = dependencies::collect(&c.git, &self.session.dependency_repos).await?;
        let text = dependencies::write(&self.config.repo_dir(&request.repo), &map).await?;
        c.git
            .commit_all(
                &request.repo,
                &format!("updated {} for {}", dependencies::DEPENDENCIES_JSON, version),
            )
            .await?;
        c.git.push(&request.repo, &request.branch).await?;

        let server = match request.stage {
            DeployStage::Production => "production",
            _ => "dev",
        };
        let body = BuildServerRequest {
            api: API_VERSION.to_string(),
            dependencies: text,
            sim_name: request.repo.clone(),
            version: version.to_string(),
            locales: vec![ALL_LOCALES.to_string()],
            servers: vec![server.to_string()],
            brands: request.brands.clone(),
            branch: request.branch.clone(),
            authorization_code: build_local.authorization_code()?.to_string(),
            email: build_local.build_server_notify_email.clone(),
        };
        c.production.request_build(&body).await?;

        log::info!("{}: build server accepted {} for {}", request.repo, version, server);
        Ok(())
    }

    async fn rollback_version(&mut self) -> Result<()> {
        let git = &self.collaborators.git;
        let request = &self.session.request;
        let Some(commit) = &self.session.version_commit else {
            return Ok(());
        };

        log::warn!("{}: reverting version commit {}", request.repo, commit.short_hash);
        git.revert(&request.repo, &commit.hash).await?;
        git.push(&request.repo, &request.branch).await?;
        Ok(())
    }

    async fn checkout_main(&mut self) -> Result<()> {
        let repo = &self.session.request.repo;
        log::warn!("{}: checking out {}", repo, MAIN_BRANCH);
        self.collaborators.git.checkout(repo, MAIN_BRANCH).await
    }

    fn report(&self) -> Result<DeployReport> {
        Ok(DeployReport {
            repo: self.session.request.repo.clone(),
            stage: self.session.request.stage,
            previous_version: self.previous()?.clone(),
            proposed_version: self.proposed()?.clone(),
            version_changed: self.session.version_changed,
            states: self.history.clone(),
        })
    }

    fn previous(&self) -> Result<&VersionIdentifier> {
        self.session
            .previous_version
            .as_ref()
            .ok_or_else(|| self.out_of_order(DeployState::VersionCompute))
    }

    fn proposed(&self) -> Result<&VersionIdentifier> {
        self.session
            .proposed_version
            .as_ref()
            .ok_or_else(|| self.out_of_order(DeployState::VersionCommit))
    }

    fn out_of_order(&self, state: DeployState) -> DeployError {
        anyhow::anyhow!(
            "{} reached {} before its inputs were computed",
            self.session.request.repo,
            state
        )
        .into()
    }
}
