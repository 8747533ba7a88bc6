//! Remote servers the pipeline publishes to.

mod dev;
mod production;

pub use dev::{DevServerClient, SshDevServer};
pub use production::{
    API_VERSION, BuildServerRequest, DEPLOY_ENDPOINT, HttpBuildServer, ProductionServerClient,
};
