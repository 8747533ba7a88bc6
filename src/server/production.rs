//! Production build server client.
//!
//! rc and production deploys end with one request asking the build server to
//! perform the authoritative build. Success means the request was accepted;
//! the pipeline never waits for the server to finish.

use crate::error::{NetworkError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Path of the deploy endpoint on the build server
pub const DEPLOY_ENDPOINT: &str = "deploy-html-simulation";

/// Request API version understood by the build server
pub const API_VERSION: &str = "2.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body of a deploy request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildServerRequest {
    /// Always [`API_VERSION`]
    pub api: String,
    /// dependencies.json contents, as a string
    pub dependencies: String,
    /// Repository / simulation name
    pub sim_name: String,
    /// Version string being deployed
    pub version: String,
    /// Locales to build
    pub locales: Vec<String>,
    /// Servers to deploy to (`dev` for rc, `production` for production)
    pub servers: Vec<String>,
    /// Brands to build
    pub brands: Vec<String>,
    /// Release branch
    pub branch: String,
    /// Shared secret from build-local.json
    pub authorization_code: String,
    /// Address to notify when the build finishes
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

/// Trait defining production build server operations
pub trait ProductionServerClient {
    /// Whether the production server answers at all
    fn is_reachable(&self) -> impl Future<Output = Result<bool>>;

    /// Send a deploy request; Ok once the server has accepted it
    fn request_build(&self, request: &BuildServerRequest) -> impl Future<Output = Result<()>>;
}

/// ProductionServerClient over HTTP
#[derive(Debug, Clone)]
pub struct HttpBuildServer {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBuildServer {
    /// Client for the server at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| NetworkError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NetworkError::Transport {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Full URL of the deploy endpoint
    pub fn endpoint(&self) -> Result<Url> {
        let text = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            DEPLOY_ENDPOINT
        );
        Url::parse(&text).map_err(|e| {
            NetworkError::InvalidUrl {
                url: text.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl ProductionServerClient for HttpBuildServer {
    async fn is_reachable(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.base_url.clone())
            .timeout(REACHABILITY_TIMEOUT)
            .send()
            .await;
        Ok(response.is_ok())
    }

    async fn request_build(&self, request: &BuildServerRequest) -> Result<()> {
        let url = self.endpoint()?;
        log::info!(
            "Requesting {} {} build of {} from {}",
            request.servers.join(","),
            request.version,
            request.sim_name,
            url
        );

        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| NetworkError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            log::info!("Build server accepted request ({})", status.as_u16());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NetworkError::Rejected {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let server = HttpBuildServer::new("https://phet.colorado.edu/").unwrap();
        assert_eq!(
            server.endpoint().unwrap().as_str(),
            "https://phet.colorado.edu/deploy-html-simulation"
        );
    }

    #[test]
    fn invalid_url_is_a_network_error() {
        assert!(matches!(
            HttpBuildServer::new("not a url"),
            Err(crate::error::DeployError::Network(NetworkError::InvalidUrl { .. }))
        ));
    }

    #[test]
    fn request_serializes_with_camel_case_and_optional_email() {
        let request = BuildServerRequest {
            api: API_VERSION.to_string(),
            dependencies: "{}".to_string(),
            sim_name: "acid-base-solutions".to_string(),
            version: "1.3.0-rc.1".to_string(),
            locales: vec!["*".to_string()],
            servers: vec!["dev".to_string()],
            brands: vec!["phet".to_string()],
            branch: "1.3".to_string(),
            authorization_code: "code".to_string(),
            email: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["simName"], "acid-base-solutions");
        assert_eq!(json["authorizationCode"], "code");
        assert!(json.get("email").is_none());
    }
}
