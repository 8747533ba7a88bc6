//! Deploy pipeline.
//!
//! A deploy moves a simulation through a fixed sequence of states, from the
//! prechecks to either a published build or a rolled-back working tree.

mod orchestrator;
mod session;
mod state;

pub use orchestrator::{Collaborators, DeployOrchestrator};
pub use session::{DeployReport, DeployRequest, DeploySession};
pub use state::{DeployState, StepOutcome};
