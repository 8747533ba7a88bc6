//! Build collaborator: dependency installation and simulation builds.
//!
//! The pipeline never looks inside the build tool. It asks for dependencies to
//! be installed, asks for a build with a handful of options, and scans the
//! build log for the one failure it must treat as fatal even when the tool
//! itself exits successfully: a missing phet-io dependency.

use crate::error::{BuildError, Result};
use crate::process;
use crate::version::VersionIdentifier;
use regex::Regex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Output lines that mean the phet-io brand could not be assembled
static MISSING_PHETIO_DEPENDENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(missing|cannot find|could not find|not found).*phet-io|phet-io.*(missing|not found)")
        .expect("phet-io marker is a valid regex")
});

/// Options for a single build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Brands to build
    pub brands: Vec<String>,
    /// Whether to minify the output
    pub minify: bool,
    /// Version being built, carrying its build timestamp
    pub version: VersionIdentifier,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Combined build log
    pub log: String,
    /// Directory holding one subdirectory per brand plus dependencies.json
    pub artifact_dir: PathBuf,
}

/// Trait defining the build operations the pipeline consumes
pub trait BuildService {
    /// Install or update the npm dependencies of a repository
    fn install_dependencies(&self, repo: &str) -> impl Future<Output = Result<()>>;

    /// Build a repository
    fn build(&self, repo: &str, options: &BuildOptions) -> impl Future<Output = Result<BuildOutput>>;
}

/// First log line signalling a missing phet-io dependency, if any
pub fn find_missing_phetio_dependency(log: &str) -> Option<&str> {
    log.lines().find(|line| MISSING_PHETIO_DEPENDENCY.is_match(line))
}

/// Fail with [`BuildError::MissingPhetioDependency`] when the log says so
pub fn check_build_log(repo: &str, log: &str) -> Result<()> {
    match find_missing_phetio_dependency(log) {
        Some(line) => Err(BuildError::MissingPhetioDependency {
            repo: repo.to_string(),
            line: line.trim().to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// BuildService running npm and grunt in `{root}/{repo}`
#[derive(Debug, Clone)]
pub struct NpmBuildService {
    root: PathBuf,
}

impl NpmBuildService {
    /// Build repositories under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn repo_dir(&self, repo: &str) -> PathBuf {
        self.root.join(repo)
    }

    /// Arguments passed to grunt for these options
    pub fn grunt_args(options: &BuildOptions) -> Vec<String> {
        let mut args = vec![
            "grunt".to_string(),
            format!("--brands={}", options.brands.join(",")),
        ];
        if !options.minify {
            args.push("--minify.minify=false".to_string());
        }
        if let Some(timestamp) = options.version.build_timestamp() {
            args.push(format!("--buildTimestamp={}", timestamp));
        }
        args
    }

    async fn npm(&self, dir: &Path, repo: &str, args: &[&str]) -> Result<()> {
        let output = process::run("npm", args, dir).await?;
        if !output.success {
            return Err(BuildError::Failed {
                repo: repo.to_string(),
                reason: format!(
                    "{} exited unsuccessfully: {}",
                    process::describe("npm", args),
                    output.stderr.trim()
                ),
            }
            .into());
        }
        Ok(())
    }
}

impl BuildService for NpmBuildService {
    async fn install_dependencies(&self, repo: &str) -> Result<()> {
        let dir = self.repo_dir(repo);
        log::info!("{}: updating npm dependencies", repo);
        self.npm(&dir, repo, &["update"]).await?;
        self.npm(&dir, repo, &["prune"]).await
    }

    async fn build(&self, repo: &str, options: &BuildOptions) -> Result<BuildOutput> {
        let dir = self.repo_dir(repo);
        let args = Self::grunt_args(options);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        log::info!("{}: building {} ({})", repo, options.version, options.brands.join(","));
        let output = process::run("npx", &arg_refs, &dir).await?;
        let log = output.combined();

        check_build_log(repo, &log)?;
        if !output.success {
            return Err(BuildError::Failed {
                repo: repo.to_string(),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }

        Ok(BuildOutput {
            log,
            artifact_dir: dir.join("build"),
        })
    }
}
