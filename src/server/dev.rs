//! Dev server access over ssh/scp.

use crate::config::BuildLocal;
use crate::error::{CliError, Result};
use crate::process;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long the reachability check waits for the ssh port
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait defining dev server operations
pub trait DevServerClient {
    /// Whether the dev server can be reached from this machine (VPN check)
    fn is_reachable(&self) -> impl Future<Output = Result<bool>>;

    /// Whether a remote directory exists
    fn directory_exists(&self, path: &str) -> impl Future<Output = Result<bool>>;

    /// Create a remote directory, including parents
    fn create_directory(&self, path: &str) -> impl Future<Output = Result<()>>;

    /// Copy the contents of a local directory into a remote directory
    fn copy_directory(&self, local: &Path, remote: &str) -> impl Future<Output = Result<()>>;
}

/// DevServerClient using the ssh and scp executables
#[derive(Debug, Clone)]
pub struct SshDevServer {
    host: String,
    target: String,
    scratch_dir: PathBuf,
}

impl SshDevServer {
    /// Client for the dev server configured in build-local.json
    pub fn new(build_local: &BuildLocal) -> Self {
        Self {
            host: build_local.dev_deploy_server.clone(),
            target: build_local.dev_ssh_target(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    async fn ssh(&self, command: &str) -> Result<process::CommandOutput> {
        process::run("ssh", &[self.target.as_str(), command], &self.scratch_dir).await
    }
}

impl DevServerClient for SshDevServer {
    async fn is_reachable(&self) -> Result<bool> {
        let address = format!("{}:22", self.host);
        let reachable = matches!(
            tokio::time::timeout(REACHABILITY_TIMEOUT, tokio::net::TcpStream::connect(&address))
                .await,
            Ok(Ok(_))
        );
        log::debug!("{} reachable: {}", address, reachable);
        Ok(reachable)
    }

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        let output = self.ssh(&format!("test -d {}", shell_quote(path))).await?;
        Ok(output.success)
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        let output = self.ssh(&format!("mkdir -p {}", shell_quote(path))).await?;
        if !output.success {
            return Err(CliError::ExecutionFailed {
                command: format!("ssh {} mkdir -p {}", self.target, path),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn copy_directory(&self, local: &Path, remote: &str) -> Result<()> {
        // Trailing "/." copies the directory's contents rather than the directory itself.
        let source = format!("{}/.", local.display());
        let destination = format!("{}:{}", self.target, remote);
        log::info!("Copying {} to {}", local.display(), destination);
        process::run_checked("scp", &["-r", source.as_str(), destination.as_str()], &self.scratch_dir)
            .await?;
        Ok(())
    }
}

/// Single-quote `text` for the remote shell.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
