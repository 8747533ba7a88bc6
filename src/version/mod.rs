//! Simulation version model.
//!
//! This module provides the version value type, the transition rules that
//! decide which version a deploy stage may write next, and the package.json
//! accessor the pipeline uses to persist it.

mod identifier;
mod package_json;
pub mod policy;

pub use identifier::{NumericField, VersionIdentifier, VersionRecord};
pub use package_json::PackageJson;
pub use policy::{DeployStage, Proposal, ReleaseCut, TransitionFlags};
