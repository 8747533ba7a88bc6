//! In-memory collaborators and repository fixtures shared by the integration tests.

#![allow(dead_code)]

use sim_release::build::{BuildOptions, BuildOutput, BuildService};
use sim_release::confirm::Confirmer;
use sim_release::error::{BuildError, GitError, NetworkError, Result};
use sim_release::git::{CommitInfo, GitRepository};
use sim_release::server::{BuildServerRequest, DevServerClient, ProductionServerClient};
use sim_release::{BuildLocal, Collaborators, DeployConfig};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const SIM: &str = "acid-base-solutions";

/// A directory of repositories on disk
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.root().join(repo)
    }

    /// Write `{repo}/package.json` with the given version and brands
    pub fn write_sim(&self, repo: &str, version: &str, brands: &[&str]) {
        let dir = self.repo_dir(repo);
        std::fs::create_dir_all(&dir).unwrap();
        let package = serde_json::json!({
            "name": repo,
            "version": version,
            "license": "GPL-3.0",
            "phet": {
                "requirejsNamespace": "ACID_BASE_SOLUTIONS",
                "phetLibs": ["twixt"],
                "supportedBrands": brands,
            }
        });
        std::fs::write(
            dir.join("package.json"),
            serde_json::to_string_pretty(&package).unwrap() + "\n",
        )
        .unwrap();
    }

    pub fn write_screenshot(&self, repo: &str) {
        let assets = self.repo_dir(repo).join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join(format!("{}-screenshot.png", repo)), b"png").unwrap();
    }

    pub fn package(&self, repo: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.repo_dir(repo).join("package.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    pub fn version(&self, repo: &str) -> String {
        self.package(repo)["version"].as_str().unwrap().to_string()
    }

    pub fn config(&self) -> DeployConfig {
        let build_local = BuildLocal {
            dev_username: Some("tester".to_string()),
            build_server_authorization_code: Some("secret".to_string()),
            ..BuildLocal::default()
        };
        DeployConfig::new(self.root(), build_local)
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub repo: String,
    pub branch: String,
    pub info: CommitInfo,
    /// package.json as committed before this commit
    parent: Option<String>,
}

#[derive(Debug, Default)]
struct GitState {
    branches: HashMap<String, String>,
    dirty: HashSet<String>,
    remote_branches: HashSet<(String, String)>,
    committed: HashMap<(String, String), String>,
    commits: Vec<RecordedCommit>,
    pushes: Vec<(String, String)>,
    checkouts: Vec<(String, String)>,
    reverts: Vec<(String, String)>,
    /// Number of pushes that succeed before every later push fails
    push_budget: Option<usize>,
}

/// Git fake that keeps one committed package.json per branch.
///
/// Checkout restores the target branch's committed package.json, so branch
/// switches behave like a real working tree for the one file deploys touch.
pub struct FakeGit {
    root: PathBuf,
    state: Mutex<GitState>,
}

impl FakeGit {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            state: Mutex::new(GitState::default()),
        }
    }

    pub fn on_branch(self, repo: &str, branch: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(repo.to_string(), branch.to_string());
        self
    }

    pub fn with_dirty(self, repo: &str) -> Self {
        self.state.lock().unwrap().dirty.insert(repo.to_string());
        self
    }

    pub fn with_remote_branch(self, repo: &str, branch: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .remote_branches
            .insert((repo.to_string(), branch.to_string()));
        self
    }

    pub fn failing_push(self) -> Self {
        self.fail_push_after(0)
    }

    pub fn fail_push_after(self, successful: usize) -> Self {
        self.state.lock().unwrap().push_budget = Some(successful);
        self
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.commits().into_iter().map(|c| c.info.message).collect()
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushes.clone()
    }

    pub fn checkouts(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().checkouts.clone()
    }

    pub fn reverts(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().reverts.clone()
    }

    pub fn branch_of(&self, repo: &str) -> String {
        branch_in(&self.state.lock().unwrap(), repo)
    }

    /// package.json last committed on `branch`
    pub fn committed_package(&self, repo: &str, branch: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .committed
            .get(&(repo.to_string(), branch.to_string()))
            .map(|text| serde_json::from_str(text).unwrap())
    }

    fn package_path(&self, repo: &str) -> PathBuf {
        self.root.join(repo).join("package.json")
    }

    fn read_package(&self, repo: &str) -> Option<String> {
        std::fs::read_to_string(self.package_path(repo)).ok()
    }

    /// First touch of a branch records the file on disk as its committed state
    fn remember(&self, state: &mut GitState, repo: &str) {
        let key = (repo.to_string(), branch_in(state, repo));
        if !state.committed.contains_key(&key)
            && let Some(text) = self.read_package(repo)
        {
            state.committed.insert(key, text);
        }
    }

    fn record_commit(&self, state: &mut GitState, repo: &str, message: &str) -> CommitInfo {
        let branch = branch_in(state, repo);
        let key = (repo.to_string(), branch.clone());
        let parent = state.committed.get(&key).cloned();
        if let Some(text) = self.read_package(repo) {
            state.committed.insert(key, text);
        }
        let info = CommitInfo::new(format!("{:040x}", state.commits.len() + 1), message);
        state.commits.push(RecordedCommit {
            repo: repo.to_string(),
            branch,
            info: info.clone(),
            parent,
        });
        info
    }
}

fn branch_in(state: &GitState, repo: &str) -> String {
    state
        .branches
        .get(repo)
        .cloned()
        .unwrap_or_else(|| "main".to_string())
}

impl GitRepository for FakeGit {
    async fn is_clean(&self, repo: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        self.remember(&mut state, repo);
        Ok(!state.dirty.contains(repo))
    }

    async fn current_branch(&self, repo: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        self.remember(&mut state, repo);
        Ok(branch_in(&state, repo))
    }

    async fn checkout(&self, repo: &str, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.remember(&mut state, repo);
        state.branches.insert(repo.to_string(), branch.to_string());
        state.checkouts.push((repo.to_string(), branch.to_string()));
        if let Some(text) = state.committed.get(&(repo.to_string(), branch.to_string())) {
            std::fs::write(self.package_path(repo), text).unwrap();
        }
        Ok(())
    }

    async fn create_branch(&self, repo: &str, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.remember(&mut state, repo);
        state.branches.insert(repo.to_string(), branch.to_string());
        self.remember(&mut state, repo);
        Ok(())
    }

    async fn commit_all(&self, repo: &str, message: &str) -> Result<CommitInfo> {
        let mut state = self.state.lock().unwrap();
        self.remember(&mut state, repo);
        Ok(self.record_commit(&mut state, repo, message))
    }

    async fn push(&self, repo: &str, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(budget) = state.push_budget
            && state.pushes.len() >= budget
        {
            return Err(GitError::PushFailed {
                repo: repo.to_string(),
                branch: branch.to_string(),
                reason: "remote rejected".to_string(),
            }
            .into());
        }
        state.pushes.push((repo.to_string(), branch.to_string()));
        state
            .remote_branches
            .insert((repo.to_string(), branch.to_string()));
        Ok(())
    }

    async fn remote_branch_exists(&self, repo: &str, branch: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .remote_branches
            .contains(&(repo.to_string(), branch.to_string())))
    }

    async fn revert(&self, repo: &str, commit: &str) -> Result<CommitInfo> {
        let mut state = self.state.lock().unwrap();
        let parent = state
            .commits
            .iter()
            .find(|c| c.repo == repo && c.info.hash == commit)
            .map(|c| c.parent.clone())
            .ok_or_else(|| GitError::CommandFailed {
                repo: repo.to_string(),
                operation: "revert".to_string(),
                reason: format!("unknown commit {}", commit),
            })?;
        if let Some(text) = parent {
            std::fs::write(self.package_path(repo), text).unwrap();
        }
        state.reverts.push((repo.to_string(), commit.to_string()));
        Ok(self.record_commit(&mut state, repo, &format!("Revert {}", commit)))
    }

    async fn head_sha(&self, repo: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .commits
            .iter()
            .rev()
            .find(|c| c.repo == repo)
            .map(|c| c.info.hash.clone())
            .unwrap_or_else(|| format!("sha-{}", repo)))
    }
}

/// Build fake writing a minimal artifact directory
pub struct FakeBuild {
    root: PathBuf,
    pub log: String,
    pub fail: bool,
    pub skip_dependencies_json: bool,
    installs: Mutex<Vec<String>>,
    builds: Mutex<Vec<(String, BuildOptions)>>,
}

impl FakeBuild {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            log: "Done.".to_string(),
            fail: false,
            skip_dependencies_json: false,
            installs: Mutex::new(Vec::new()),
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn with_log(mut self, log: &str) -> Self {
        self.log = log.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn without_dependencies_json(mut self) -> Self {
        self.skip_dependencies_json = true;
        self
    }

    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }

    pub fn builds(&self) -> Vec<(String, BuildOptions)> {
        self.builds.lock().unwrap().clone()
    }
}

impl BuildService for FakeBuild {
    async fn install_dependencies(&self, repo: &str) -> Result<()> {
        self.installs.lock().unwrap().push(repo.to_string());
        Ok(())
    }

    async fn build(&self, repo: &str, options: &BuildOptions) -> Result<BuildOutput> {
        self.builds
            .lock()
            .unwrap()
            .push((repo.to_string(), options.clone()));
        if self.fail {
            return Err(BuildError::Failed {
                repo: repo.to_string(),
                reason: "grunt exited with status 1".to_string(),
            }
            .into());
        }

        let artifact_dir = self.root.join(repo).join("build");
        for brand in &options.brands {
            std::fs::create_dir_all(artifact_dir.join(brand)).unwrap();
        }
        std::fs::create_dir_all(&artifact_dir).unwrap();
        if !self.skip_dependencies_json {
            std::fs::write(
                artifact_dir.join("dependencies.json"),
                format!("{{\"{}\": {{\"sha\": \"built\", \"branch\": \"main\"}}}}\n", repo),
            )
            .unwrap();
        }

        Ok(BuildOutput {
            log: self.log.clone(),
            artifact_dir,
        })
    }
}

/// Dev server fake
pub struct FakeDevServer {
    pub reachable: bool,
    existing: Mutex<HashSet<String>>,
    copies: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeDevServer {
    pub fn new() -> Self {
        Self {
            reachable: true,
            existing: Mutex::new(HashSet::new()),
            copies: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn with_directory(self, path: &str) -> Self {
        self.existing.lock().unwrap().insert(path.to_string());
        self
    }

    pub fn copies(&self) -> Vec<(PathBuf, String)> {
        self.copies.lock().unwrap().clone()
    }
}

impl DevServerClient for FakeDevServer {
    async fn is_reachable(&self) -> Result<bool> {
        Ok(self.reachable)
    }

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        Ok(self.existing.lock().unwrap().contains(path))
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        self.existing.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    async fn copy_directory(&self, local: &Path, remote: &str) -> Result<()> {
        self.copies
            .lock()
            .unwrap()
            .push((local.to_path_buf(), remote.to_string()));
        Ok(())
    }
}

/// Production build server fake
pub struct FakeProductionServer {
    pub reachable: bool,
    pub reject: bool,
    requests: Mutex<Vec<BuildServerRequest>>,
}

impl FakeProductionServer {
    pub fn new() -> Self {
        Self {
            reachable: true,
            reject: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn requests(&self) -> Vec<BuildServerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ProductionServerClient for FakeProductionServer {
    async fn is_reachable(&self) -> Result<bool> {
        Ok(self.reachable)
    }

    async fn request_build(&self, request: &BuildServerRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reject {
            return Err(NetworkError::Rejected {
                url: "https://build.test/deploy-html-simulation".to_string(),
                status: 500,
                body: "internal error".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Answers confirmation prompts from a script; an exhausted script declines
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

pub type FakeCollaborators =
    Collaborators<FakeGit, FakeBuild, FakeDevServer, FakeProductionServer, ScriptedConfirmer>;

/// Fakes rooted at `workspace`, with the sim on `branch` and the given answers
pub fn collaborators(workspace: &Workspace, branch: &str, answers: &[bool]) -> FakeCollaborators {
    Collaborators {
        git: FakeGit::new(workspace.root()).on_branch(SIM, branch),
        build: FakeBuild::new(workspace.root()),
        dev_server: FakeDevServer::new(),
        production: FakeProductionServer::new(),
        confirmer: ScriptedConfirmer::new(answers),
    }
}
