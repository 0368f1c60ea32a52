//! CLI command implementations

pub mod commit;
pub mod plan;
pub mod pr;
pub mod worktree;

use std::path::{Path, PathBuf};

use anyhow::Context;
use implflow_core::{Config, SystemRunner, WorkflowContext, git::GitCli};

use crate::output::OutputMode;

pub use commit::{run_commit_phase, run_commit_plan};
pub use plan::{ContextCommands, TaskCommands, run_branch_name, run_context, run_init, run_status, run_task};
pub use pr::{PrArgs, run_pr, run_pr_template};
pub use worktree::{
    WorktreeCommands, run_check_branch, run_check_clean, run_create_branch, run_worktree,
};

/// Global flags every command receives
pub struct Invocation {
    pub output: OutputMode,
    pub repo: Option<PathBuf>,
}

impl Invocation {
    /// Directory the invocation starts from: `--repo` or the current directory
    fn start_dir(&self) -> anyhow::Result<PathBuf> {
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        Ok(match &self.repo {
            Some(repo) => cwd.join(repo),
            None => cwd,
        })
    }

    /// Make a user-supplied path absolute against the current directory
    pub fn absolute(&self, path: &Path) -> anyhow::Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        Ok(cwd.join(path))
    }

    /// Build the workflow context.
    ///
    /// The repository root is the enclosing git toplevel when there is one;
    /// plan-only commands still work outside a repository.
    pub fn context(
        &self,
        plan_dir: Option<&Path>,
        base: Option<String>,
    ) -> anyhow::Result<WorkflowContext> {
        let start = self.start_dir()?;
        let bootstrap = Config::load_from_project(&start)
            .with_context(|| format!("loading config for {}", start.display()))?;

        let repo_root = match GitCli::new(&SystemRunner, &start, &bootstrap.implflow).show_toplevel() {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!(error = %e, "no enclosing repository, using start directory");
                start
            }
        };
        let config = Config::load_from_project(&repo_root)
            .with_context(|| format!("loading config for {}", repo_root.display()))?;

        let plan_dir = plan_dir.map(|p| self.absolute(p)).transpose()?;
        Ok(WorkflowContext::new(&repo_root, &config)
            .with_plan_dir(plan_dir)
            .with_base_branch(base))
    }

    /// Working directory for git commands: `--dir` or the repository root
    pub fn work_dir(&self, ctx: &WorkflowContext, dir: Option<&Path>) -> anyhow::Result<PathBuf> {
        match dir {
            Some(dir) => self.absolute(dir),
            None => Ok(ctx.repo_root.clone()),
        }
    }
}

/// Render an anyhow chain for the top-level `error:` line
pub(crate) fn setup_error(err: anyhow::Error) -> String {
    format!("{:#}", err)
}
