//! Explicit workflow context
//!
//! Operations never read the process working directory or environment;
//! the caller resolves everything up front and passes a [`WorkflowContext`].

use std::path::{Path, PathBuf};

use crate::config::{Config, ImplflowConfig};
use crate::error::ImplflowError;
use crate::exec::CommandRunner;
use crate::gh::GhCli;
use crate::git::GitCli;

/// Repository, plan and branch settings for one workflow invocation
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// Root of the repository checkout operations start from
    pub repo_root: PathBuf,
    /// Plan directory bound to this invocation, if any
    pub plan_dir: Option<PathBuf>,
    /// Branch new work is based on and PRs target
    pub base_branch: String,
    pub settings: ImplflowConfig,
}

impl WorkflowContext {
    pub fn new(repo_root: &Path, config: &Config) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            plan_dir: None,
            base_branch: config.implflow.base_branch.clone(),
            settings: config.implflow.clone(),
        }
    }

    pub fn with_plan_dir(mut self, plan_dir: Option<PathBuf>) -> Self {
        self.plan_dir = plan_dir.map(|p| self.resolve(&p));
        self
    }

    pub fn with_base_branch(mut self, base: Option<String>) -> Self {
        if let Some(base) = base {
            self.base_branch = base;
        }
        self
    }

    /// Bound plan directory, or an error naming what is missing
    pub fn plan_dir(&self) -> Result<&Path, ImplflowError> {
        self.plan_dir
            .as_deref()
            .ok_or_else(|| ImplflowError::Config("no plan directory given".to_string()))
    }

    /// Resolve a path relative to the repository root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        }
    }

    /// Git helper running in `dir`
    pub fn git<'a>(&self, runner: &'a dyn CommandRunner, dir: &Path) -> GitCli<'a> {
        GitCli::new(runner, dir, &self.settings)
    }

    /// Hosting CLI helper running in `dir`
    pub fn gh<'a>(&self, runner: &'a dyn CommandRunner, dir: &Path) -> GhCli<'a> {
        GhCli::new(runner, dir, &self.settings)
    }
}
