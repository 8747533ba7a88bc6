//! Command execution.
//!
//! Each command builds the real collaborators from the runtime configuration
//! and hands them to the library; errors are reported here with recovery
//! suggestions and turned into exit code 1.

mod branch;
mod deploy;
mod helpers;
mod preview;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use branch::{execute_create_one_off, execute_create_release};
use deploy::execute_deploy;
use preview::execute_preview;

/// Execute the command named by the parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Deploy { stage, target } => execute_deploy(*stage, target, &config).await,
        Command::CreateRelease {
            repo,
            branch,
            brands,
            message,
        } => execute_create_release(repo, branch, brands, message.as_deref(), &config).await,
        Command::CreateOneOff {
            repo,
            branch,
            message,
        } => execute_create_one_off(repo, branch, message.as_deref(), &config).await,
        Command::Preview {
            repo,
            stage,
            branch,
            redeploy,
            noninteractive,
            json,
        } => {
            let options = preview::PreviewOptions {
                repo,
                stage: *stage,
                branch: branch.as_deref(),
                redeploy: *redeploy,
                noninteractive: *noninteractive,
                json: *json,
            };
            execute_preview(&options, &config).await
        }
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                config.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.indent(&format!("• {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
