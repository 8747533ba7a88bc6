//! Release and one-off branch creation.

use crate::build::{BuildOptions, BuildService};
use crate::config::DeployConfig;
use crate::dependencies::DEPENDENCIES_JSON;
use crate::error::{BuildError, PreconditionError, Result, ValidationError};
use crate::git::GitRepository;
use crate::version::policy::{self, MAIN_BRANCH};
use crate::version::{PackageJson, VersionIdentifier};
use anyhow::Context;

/// Brand built for one-off branches whose package.json lists none
const DEFAULT_BRAND: &str = "phet";

/// A freshly created release branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranch {
    /// Repository the branch lives in
    pub repo: String,
    /// Branch name, `MAJOR.MINOR`
    pub name: String,
    /// Brands recorded in the branch's package.json
    pub supported_brands: Vec<String>,
    /// Version written on the branch (`MAJOR.MINOR.0-rc.0`)
    pub release_version: VersionIdentifier,
    /// Version written back on `main` (`MAJOR.(MINOR+1).0-dev.0`)
    pub main_version: VersionIdentifier,
}

/// A freshly created one-off branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOffBranch {
    /// Repository the branch lives in
    pub repo: String,
    /// Branch name, also the test type of its versions
    pub name: String,
    /// First version on the branch
    pub version: VersionIdentifier,
}

/// Creates release and one-off branches.
///
/// Every step either commits and pushes or fails; nothing is undone when a
/// later step fails, so a half-created branch has to be cleaned up by hand.
pub struct ReleaseBranchManager<'a, G, B> {
    config: &'a DeployConfig,
    git: &'a G,
    build: &'a B,
}

impl<'a, G: GitRepository, B: BuildService> ReleaseBranchManager<'a, G, B> {
    /// Manager over the given collaborators
    pub fn new(config: &'a DeployConfig, git: &'a G, build: &'a B) -> Self {
        Self { config, git, build }
    }

    /// Validate a release branch name and return the version it implies.
    ///
    /// The name must be `MAJOR.MINOR` with a positive major.
    pub fn ensure_release_branch(&self, name: &str) -> Result<VersionIdentifier> {
        let version = VersionIdentifier::from_branch(name)?;
        if version.major() == 0 {
            return Err(ValidationError::InvalidBranch {
                branch: name.to_string(),
                reason: "major version must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(version)
    }

    /// Cut release branch `name` from `main`.
    ///
    /// The branch gets `MAJOR.MINOR.0-rc.0`, the supported brands and a
    /// dependencies.json from a fresh build; `main` moves on to the next
    /// minor's `dev.0`. Ends with the release branch checked out.
    pub async fn create_release(
        &self,
        repo: &str,
        name: &str,
        brands: &[String],
        message: Option<&str>,
    ) -> Result<ReleaseBranch> {
        let branch_version = self.ensure_release_branch(name)?;
        let cut = policy::cut_release_branch(&branch_version)?;
        let repo_dir = self.config.repo_dir(repo);

        self.require_on_main(repo).await?;
        if !self.git.is_clean(repo).await? {
            return Err(PreconditionError::DirtyWorkingTree {
                repo: repo.to_string(),
            }
            .into());
        }
        if self.git.remote_branch_exists(repo, name).await? {
            return Err(PreconditionError::RemoteBranchExists {
                repo: repo.to_string(),
                branch: name.to_string(),
            }
            .into());
        }

        log::info!("{}: creating release branch {}", repo, name);
        self.git.create_branch(repo, name).await?;

        let mut package = PackageJson::load(&repo_dir).await?;
        package.set_supported_brands(brands);
        package.set_version(&cut.release_version);
        package.save().await?;
        self.git
            .commit_all(repo, &commit_message(&cut.release_version, message))
            .await?;
        self.git.push(repo, name).await?;

        self.record_dependencies(repo, name, brands, &cut.release_version).await?;

        log::info!("{}: moving {} to {}", repo, MAIN_BRANCH, cut.main_version);
        self.git.checkout(repo, MAIN_BRANCH).await?;
        let mut package = PackageJson::load(&repo_dir).await?;
        package.set_version(&cut.main_version);
        package.save().await?;
        self.git
            .commit_all(repo, &commit_message(&cut.main_version, message))
            .await?;
        self.git.push(repo, MAIN_BRANCH).await?;

        self.git.checkout(repo, name).await?;

        Ok(ReleaseBranch {
            repo: repo.to_string(),
            name: name.to_string(),
            supported_brands: brands.to_vec(),
            release_version: cut.release_version,
            main_version: cut.main_version,
        })
    }

    /// Create one-off branch `name` from the current branch.
    ///
    /// The first version keeps the current major and minor, resets the
    /// maintenance number and uses the branch name as its test type. Like a
    /// release branch it gets a dependencies.json from a fresh build of its
    /// supported brands; `main` is left alone.
    pub async fn create_one_off(&self, repo: &str, name: &str, message: Option<&str>) -> Result<OneOffBranch> {
        let repo_dir = self.config.repo_dir(repo);

        if !self.git.is_clean(repo).await? {
            return Err(PreconditionError::DirtyWorkingTree {
                repo: repo.to_string(),
            }
            .into());
        }
        if self.git.remote_branch_exists(repo, name).await? {
            return Err(PreconditionError::RemoteBranchExists {
                repo: repo.to_string(),
                branch: name.to_string(),
            }
            .into());
        }

        let mut package = PackageJson::load(&repo_dir).await?;
        let version = policy::seed_one_off(&package.version()?, name)?;

        log::info!("{}: creating one-off branch {} at {}", repo, name, version);
        self.git.create_branch(repo, name).await?;
        package.set_version(&version);
        package.save().await?;
        self.git.commit_all(repo, &commit_message(&version, message)).await?;
        self.git.push(repo, name).await?;

        let mut brands = package.supported_brands();
        if brands.is_empty() {
            brands.push(DEFAULT_BRAND.to_string());
        }
        self.record_dependencies(repo, name, &brands, &version).await?;

        Ok(OneOffBranch {
            repo: repo.to_string(),
            name: name.to_string(),
            version,
        })
    }

    /// Build `version` once and commit the resulting dependencies.json on `branch`.
    async fn record_dependencies(
        &self,
        repo: &str,
        branch: &str,
        brands: &[String],
        version: &VersionIdentifier,
    ) -> Result<()> {
        let repo_dir = self.config.repo_dir(repo);
        for dependency in std::iter::once(repo).chain(self.config.toolchain_repos.iter().map(String::as_str)) {
            self.build.install_dependencies(dependency).await?;
        }
        let options = BuildOptions {
            brands: brands.to_vec(),
            minify: true,
            version: version.clone(),
        };
        let output = self.build.build(repo, &options).await?;
        crate::build::check_build_log(repo, &output.log)?;

        let built = output.artifact_dir.join(DEPENDENCIES_JSON);
        if !tokio::fs::try_exists(&built).await.unwrap_or(false) {
            return Err(BuildError::MissingArtifact {
                repo: repo.to_string(),
                path: built,
            }
            .into());
        }
        tokio::fs::copy(&built, repo_dir.join(DEPENDENCIES_JSON))
            .await
            .with_context(|| format!("copying {} into {}", built.display(), repo_dir.display()))?;
        self.git
            .commit_all(repo, &format!("updated {} for {}", DEPENDENCIES_JSON, version))
            .await?;
        self.git.push(repo, branch).await?;
        Ok(())
    }

    async fn require_on_main(&self, repo: &str) -> Result<()> {
        let current = self.git.current_branch(repo).await?;
        if current != MAIN_BRANCH {
            return Err(PreconditionError::WrongBranch {
                repo: repo.to_string(),
                expected: MAIN_BRANCH.to_string(),
                actual: current,
            }
            .into());
        }
        Ok(())
    }
}

/// `Bumping version to X`, with the operator's message appended
pub fn commit_message(version: &VersionIdentifier, message: Option<&str>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => {
            format!("Bumping version to {}: {}", version, message.trim())
        }
        _ => format!("Bumping version to {}", version),
    }
}
