//! Command line interface for sim_release.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, DeployTarget, RuntimeConfig, resolve_branch};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(&args);
    execute_command(args).await
}

/// Install the env_logger backend at the level the flags ask for.
fn init_logging(args: &Args) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();
}
