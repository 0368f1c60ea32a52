//! Configuration handling for implflow

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ImplflowError;

/// Project-level config location, relative to the repository root
pub const PROJECT_CONFIG: &str = ".implflow/config.toml";

/// Implflow configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Implflow-specific settings
    #[serde(default)]
    pub implflow: ImplflowConfig,
}

/// Core implflow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplflowConfig {
    /// Branch new work is based on
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Remote that branches are pushed to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Path to the git binary
    #[serde(default = "default_git_path")]
    pub git_path: String,

    /// Path to the GitHub CLI binary
    #[serde(default = "default_gh_path")]
    pub gh_path: String,

    /// Bound for push and PR creation, in seconds
    #[serde(default = "default_network_timeout")]
    pub network_timeout_secs: u64,

    /// Bound for local git commands, in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Directory searched for plan directories when none is given
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Prefix context entries with a timestamp
    #[serde(default = "default_true")]
    pub timestamp_context: bool,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_git_path() -> String {
    "git".to_string()
}

fn default_gh_path() -> String {
    "gh".to_string()
}

fn default_network_timeout() -> u64 {
    60
}

fn default_command_timeout() -> u64 {
    30
}

fn default_docs_dir() -> String {
    ".docs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ImplflowConfig {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            remote: default_remote(),
            git_path: default_git_path(),
            gh_path: default_gh_path(),
            network_timeout_secs: default_network_timeout(),
            command_timeout_secs: default_command_timeout(),
            docs_dir: default_docs_dir(),
            timestamp_context: default_true(),
        }
    }
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ImplflowError> {
        toml::from_str(content).map_err(|e| ImplflowError::Config(e.to_string()))
    }

    /// Load config for a repository.
    ///
    /// Looks in `<repo_root>/.implflow/config.toml`, then the user config
    /// directory, then falls back to defaults. `IMPLFLOW_GIT_PATH` and
    /// `IMPLFLOW_GH_PATH` override the binary paths.
    pub fn load_from_project(repo_root: &Path) -> Result<Self, ImplflowError> {
        let mut config = match Self::candidate_paths(repo_root)
            .into_iter()
            .find(|p| p.is_file())
        {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        if let Ok(git) = std::env::var("IMPLFLOW_GIT_PATH") {
            config.implflow.git_path = git;
        }
        if let Ok(gh) = std::env::var("IMPLFLOW_GH_PATH") {
            config.implflow.gh_path = gh;
        }

        Ok(config)
    }

    fn candidate_paths(repo_root: &Path) -> Vec<PathBuf> {
        let mut paths = vec![repo_root.join(PROJECT_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("implflow").join("config.toml"));
        }
        paths
    }
}
