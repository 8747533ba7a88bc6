//! Build-local and deploy configuration.
//!
//! Personal settings (dev server account, build server credentials) live in
//! `~/.phet/build-local.json`. Individual settings can be overridden with
//! environment variables so CI jobs need no file on disk.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var pointing at an alternate build-local.json
pub const BUILD_LOCAL_ENV: &str = "SIM_RELEASE_BUILD_LOCAL";

const DEV_USERNAME_ENV: &str = "SIM_RELEASE_DEV_USERNAME";
const DEV_SERVER_ENV: &str = "SIM_RELEASE_DEV_SERVER";
const PRODUCTION_URL_ENV: &str = "SIM_RELEASE_PRODUCTION_URL";
const AUTH_CODE_ENV: &str = "SIM_RELEASE_AUTH_CODE";

/// Contents of build-local.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildLocal {
    /// Account used for ssh/scp to the dev server
    pub dev_username: Option<String>,
    /// Dev server host name
    pub dev_deploy_server: String,
    /// Root directory of dev deploys on the dev server
    pub dev_deploy_path: String,
    /// Base URL of the production build server
    #[serde(rename = "productionServerURL")]
    pub production_server_url: String,
    /// Authorization code sent with build server requests
    pub build_server_authorization_code: Option<String>,
    /// Address the build server notifies when done
    pub build_server_notify_email: Option<String>,
}

impl Default for BuildLocal {
    fn default() -> Self {
        Self {
            dev_username: None,
            dev_deploy_server: "bayes.colorado.edu".to_string(),
            dev_deploy_path: "/data/web/htdocs/dev/html/".to_string(),
            production_server_url: "https://phet.colorado.edu".to_string(),
            build_server_authorization_code: None,
            build_server_notify_email: None,
        }
    }
}

impl BuildLocal {
    /// Default location, `~/.phet/build-local.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".phet").join("build-local.json"))
    }

    /// Load from `SIM_RELEASE_BUILD_LOCAL` or the default path, then apply env overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let path = match std::env::var(BUILD_LOCAL_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => Self::default_path()?,
        };
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            log::debug!("{} not found, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a build-local.json file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ConfigError::LoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Override settings from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(DEV_USERNAME_ENV) {
            self.dev_username = Some(value);
        }
        if let Ok(value) = std::env::var(DEV_SERVER_ENV) {
            self.dev_deploy_server = value;
        }
        if let Ok(value) = std::env::var(PRODUCTION_URL_ENV) {
            self.production_server_url = value;
        }
        if let Ok(value) = std::env::var(AUTH_CODE_ENV) {
            self.build_server_authorization_code = Some(value);
        }
    }

    /// Authorization code, required for rc and production deploys
    pub fn authorization_code(&self) -> Result<&str> {
        self.build_server_authorization_code
            .as_deref()
            .ok_or_else(|| {
                ConfigError::MissingSetting {
                    key: "buildServerAuthorizationCode",
                    env: AUTH_CODE_ENV,
                }
                .into()
            })
    }

    /// `user@host` (or just `host`) for ssh
    pub fn dev_ssh_target(&self) -> String {
        match &self.dev_username {
            Some(user) => format!("{}@{}", user, self.dev_deploy_server),
            None => self.dev_deploy_server.clone(),
        }
    }

    /// Remote directory for `repo` at `version`, without duplicate slashes.
    pub fn dev_version_path(&self, repo: &str, version: &str) -> String {
        format!(
            "{}/{}/{}",
            self.dev_deploy_path.trim_end_matches('/'),
            repo,
            version
        )
    }

    /// Public URL of a dev deploy for one brand
    pub fn dev_url(&self, repo: &str, version: &str, brand: &str) -> String {
        format!(
            "https://{}/dev/html/{}/{}/{}/",
            self.dev_deploy_server, repo, version, brand
        )
    }
}

/// Everything a deploy or branch operation needs besides its collaborators
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Directory containing all repositories side by side
    pub root: PathBuf,
    /// Personal settings
    pub build_local: BuildLocal,
    /// Toolchain repositories whose dependencies are refreshed before a build
    pub toolchain_repos: Vec<String>,
    /// Libraries every simulation depends on
    pub common_dependencies: Vec<String>,
}

impl DeployConfig {
    /// Configuration with default toolchain and dependency lists
    pub fn new(root: impl Into<PathBuf>, build_local: BuildLocal) -> Self {
        Self {
            root: root.into(),
            build_local,
            toolchain_repos: ["chipper", "perennial-alias"]
                .into_iter()
                .map(String::from)
                .collect(),
            common_dependencies: [
                "assert",
                "axon",
                "brand",
                "chipper",
                "dot",
                "joist",
                "kite",
                "perennial-alias",
                "phet-core",
                "phetcommon",
                "query-string-machine",
                "scenery",
                "scenery-phet",
                "sherpa",
                "sun",
                "tandem",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    /// Directory of a repository
    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.root.join(repo)
    }
}
