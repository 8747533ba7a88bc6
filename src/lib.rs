//! # sim_release
//!
//! Versioning, building and deploying of PhET simulations.
//!
//! A deploy computes the next version from the one stored in package.json,
//! commits it, builds the simulation and publishes it to the dev server or
//! asks the production build server to deploy it. Declining a post-build
//! confirmation reverts the version commit; any failure returns the working
//! tree to `main`.
//!
//! ## Usage
//!
//! ```bash
//! sim_release deploy dev --repo acid-base-solutions
//! sim_release deploy rc --repo acid-base-solutions --branch 1.3
//! sim_release deploy production --repo acid-base-solutions --branch 1.3
//! sim_release create-release --repo acid-base-solutions --branch 1.3 --brands phet,phet-io
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod build;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod dependencies;
pub mod deploy;
pub mod error;
pub mod git;
pub mod process;
pub mod release;
pub mod server;
pub mod version;

pub use cli::Args;
pub use config::{BuildLocal, DeployConfig};
pub use deploy::{Collaborators, DeployOrchestrator, DeployReport, DeployRequest, DeployState};
pub use error::{DeployError, Result};
pub use release::ReleaseBranchManager;
pub use version::{DeployStage, PackageJson, VersionIdentifier};
