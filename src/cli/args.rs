//! Command line argument parsing and validation.

use crate::version::DeployStage;
use crate::version::policy::MAIN_BRANCH;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Deploy PhET simulations and manage their release branches
#[derive(Parser, Debug)]
#[command(
    name = "sim_release",
    version,
    about = "Deploy simulations to dev, rc and production",
    long_about = "Version, build and deploy simulations, and cut their release branches.

Usage:
  sim_release deploy dev --repo acid-base-solutions
  sim_release deploy rc --repo acid-base-solutions --branch 1.3 --brands phet,phet-io
  sim_release deploy production --repo acid-base-solutions --branch 1.3
  sim_release create-release --repo acid-base-solutions --branch 1.3 --brands phet
  sim_release preview --repo acid-base-solutions --stage rc --branch 1.3"
)]
pub struct Args {
    /// Directory containing the simulation and library repositories
    #[arg(long, global = true, env = "SIM_RELEASE_ROOT", default_value = "..")]
    pub root: PathBuf,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Version, build and deploy a simulation
    Deploy {
        /// Target stage
        #[arg(value_enum)]
        stage: DeployStage,

        #[command(flatten)]
        target: DeployTarget,
    },

    /// Cut a MAJOR.MINOR release branch from main
    CreateRelease {
        /// Simulation repository
        #[arg(long)]
        repo: String,

        /// Release branch name, MAJOR.MINOR
        #[arg(long)]
        branch: String,

        /// Brands the release branch supports
        #[arg(long, value_delimiter = ',', default_value = "phet")]
        brands: Vec<String>,

        /// Appended to the version bump commit messages
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Create a one-off branch from the current branch
    CreateOneOff {
        /// Simulation repository
        #[arg(long)]
        repo: String,

        /// One-off branch name, also used as the version test type
        #[arg(long)]
        branch: String,

        /// Appended to the version bump commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the version a deploy would write, without changing anything
    Preview {
        /// Simulation repository
        #[arg(long)]
        repo: String,

        /// Stage to preview
        #[arg(long, value_enum)]
        stage: DeployStage,

        /// Branch the deploy would run from (defaults to main for dev)
        #[arg(long)]
        branch: Option<String>,

        /// Preview a production redeploy
        #[arg(long)]
        redeploy: bool,

        /// Preview a noninteractive run
        #[arg(long)]
        noninteractive: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every deploy stage
#[derive(ClapArgs, Debug, Clone)]
pub struct DeployTarget {
    /// Simulation repository
    #[arg(long)]
    pub repo: String,

    /// Branch to deploy from (defaults to main for dev, required for rc/production)
    #[arg(long)]
    pub branch: Option<String>,

    /// Brands to build and deploy
    #[arg(long, value_delimiter = ',', default_value = "phet")]
    pub brands: Vec<String>,

    /// Skip confirmation prompts and build unminified
    #[arg(long)]
    pub noninteractive: bool,

    /// Re-deploy an already published production version
    #[arg(long)]
    pub redeploy: bool,

    /// Appended to the version bump commit message
    #[arg(short, long)]
    pub message: Option<String>,
}

impl Command {
    /// Name used in status messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Deploy { .. } => "deploy",
            Command::CreateRelease { .. } => "create-release",
            Command::CreateOneOff { .. } => "create-one-off",
            Command::Preview { .. } => "preview",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for `-v`/`-q`; `RUST_LOG` still takes precedence
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Deploy { stage, target } => {
                resolve_branch(*stage, target.branch.as_deref())?;
                if target.redeploy && *stage != DeployStage::Production {
                    return Err("--redeploy only applies to production deploys".to_string());
                }
                if target.brands.iter().any(|brand| brand.trim().is_empty()) {
                    return Err("--brands must not contain empty names".to_string());
                }
                Ok(())
            }
            Command::Preview { stage, branch, .. } => resolve_branch(*stage, branch.as_deref()).map(|_| ()),
            Command::CreateOneOff { branch, .. } if branch == MAIN_BRANCH => {
                Err(format!("a one-off branch cannot be named '{}'", MAIN_BRANCH))
            }
            _ => Ok(()),
        }
    }
}

/// Branch a stage deploys from: `main` by default for dev, explicit otherwise
pub fn resolve_branch(stage: DeployStage, branch: Option<&str>) -> Result<String, String> {
    match (stage, branch) {
        (_, Some(branch)) => Ok(branch.to_string()),
        (DeployStage::Dev, None) => Ok(MAIN_BRANCH.to_string()),
        (stage, None) => Err(format!("--branch is required for {} deploys", stage)),
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    /// Directory containing all repositories
    pub root: PathBuf,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(root: PathBuf, verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
            root,
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.root.clone(), args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn log_filter_follows_verbosity_flags() {
        let preview = |flag: Option<&str>| {
            let mut argv = vec!["sim_release", "preview", "--repo", "acid-base-solutions", "--stage", "dev"];
            argv.extend(flag);
            parse(&argv)
        };
        assert_eq!(preview(None).log_filter(), "info");
        assert_eq!(preview(Some("-v")).log_filter(), "debug");
        assert_eq!(preview(Some("--quiet")).log_filter(), "error");
    }

    #[test]
    fn dev_deploy_defaults_to_main() {
        let args = parse(&["sim_release", "deploy", "dev", "--repo", "faradays-law"]);
        let Command::Deploy { stage, target } = &args.command else {
            panic!("expected deploy");
        };
        assert_eq!(*stage, DeployStage::Dev);
        assert_eq!(target.brands, vec!["phet"]);
        assert_eq!(resolve_branch(*stage, target.branch.as_deref()).unwrap(), "main");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn rc_requires_branch() {
        let args = parse(&["sim_release", "deploy", "rc", "--repo", "faradays-law"]);
        assert!(args.validate().unwrap_err().contains("--branch"));

        let args = parse(&[
            "sim_release",
            "deploy",
            "rc",
            "--repo",
            "faradays-law",
            "--branch",
            "1.3",
            "--brands",
            "phet,phet-io",
        ]);
        assert!(args.validate().is_ok());
        let Command::Deploy { target, .. } = &args.command else {
            panic!("expected deploy");
        };
        assert_eq!(target.brands, vec!["phet", "phet-io"]);
    }

    #[test]
    fn redeploy_is_production_only() {
        let args = parse(&["sim_release", "deploy", "dev", "--repo", "x", "--redeploy"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn one_off_cannot_be_main() {
        let args = parse(&["sim_release", "create-one-off", "--repo", "x", "--branch", "main"]);
        assert!(args.validate().is_err());
    }
}
