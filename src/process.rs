//! Async subprocess execution shared by the git, build and dev-server adapters.

use crate::error::{CliError, Result};
use std::path::Path;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, for logs scanned as one text
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Run `program args...` in `cwd` and capture its output.
///
/// A non-zero exit is reported through [`CommandOutput::success`], not as an
/// error; only a failure to start the process is an error.
pub async fn run(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let executable = which::which(program).map_err(|_| CliError::ProgramNotFound {
        program: program.to_string(),
    })?;

    log::debug!("Running {} {} in {}", program, args.join(" "), cwd.display());

    let output = tokio::process::Command::new(executable)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| CliError::ExecutionFailed {
            command: describe(program, args),
            reason: e.to_string(),
        })?;

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a command and fail unless it exits successfully; returns trimmed stdout.
pub async fn run_checked(program: &str, args: &[&str], cwd: &Path) -> Result<String> {
    let output = run(program, args, cwd).await?;
    if !output.success {
        return Err(CliError::ExecutionFailed {
            command: describe(program, args),
            reason: output.stderr.trim().to_string(),
        }
        .into());
    }
    Ok(output.stdout.trim().to_string())
}

/// Human-readable command line
pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
