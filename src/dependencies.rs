//! Dependency repositories of a simulation and the dependencies.json record.

use crate::config::DeployConfig;
use crate::error::Result;
use crate::git::GitRepository;
use crate::version::PackageJson;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// File name of the dependency record
pub const DEPENDENCIES_JSON: &str = "dependencies.json";

/// Where one dependency repository stood when the record was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// HEAD commit
    pub sha: String,
    /// Checked-out branch
    pub branch: String,
}

/// Repository name to its state, sorted by name
pub type DependencyMap = BTreeMap<String, DependencyEntry>;

/// The simulation itself, the common libraries and its `phet.phetLibs`,
/// de-duplicated and sorted.
pub fn dependency_repos(config: &DeployConfig, repo: &str, package: &PackageJson) -> Vec<String> {
    let mut repos: BTreeSet<String> = config.common_dependencies.iter().cloned().collect();
    repos.insert(repo.to_string());
    repos.extend(package.phet_libs());
    repos.into_iter().collect()
}

/// Record HEAD and branch of every repository in `repos`.
pub async fn collect<G: GitRepository>(git: &G, repos: &[String]) -> Result<DependencyMap> {
    let mut map = DependencyMap::new();
    for repo in repos {
        let entry = DependencyEntry {
            sha: git.head_sha(repo).await?,
            branch: git.current_branch(repo).await?,
        };
        map.insert(repo.clone(), entry);
    }
    Ok(map)
}

/// Pretty JSON with a trailing newline
pub fn to_json(map: &DependencyMap) -> Result<String> {
    let mut text = serde_json::to_string_pretty(map)?;
    text.push('\n');
    Ok(text)
}

/// Write dependencies.json into `repo_dir`, returning the written text
pub async fn write(repo_dir: &Path, map: &DependencyMap) -> Result<String> {
    let text = to_json(map)?;
    tokio::fs::write(repo_dir.join(DEPENDENCIES_JSON), &text).await?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildLocal;

    #[tokio::test]
    async fn repos_include_sim_and_phet_libs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"version": "1.0.0-dev.1", "phet": {"phetLibs": ["twixt", "axon"]}}"#,
        )
        .unwrap();
        let package = PackageJson::load(dir.path()).await.unwrap();

        let mut config = DeployConfig::new(dir.path(), BuildLocal::default());
        config.common_dependencies = vec!["chipper".to_string(), "axon".to_string()];

        assert_eq!(
            dependency_repos(&config, "wave-on-a-string", &package),
            vec!["axon", "chipper", "twixt", "wave-on-a-string"]
        );
    }

    #[test]
    fn json_is_sorted_and_newline_terminated() {
        let mut map = DependencyMap::new();
        map.insert(
            "sun".to_string(),
            DependencyEntry {
                sha: "bbb".to_string(),
                branch: "main".to_string(),
            },
        );
        map.insert(
            "axon".to_string(),
            DependencyEntry {
                sha: "aaa".to_string(),
                branch: "main".to_string(),
            },
        );
        let text = to_json(&map).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.find("\"axon\"").unwrap() < text.find("\"sun\"").unwrap());
    }
}
