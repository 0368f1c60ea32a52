//! Worktree and branch lifecycle for plan implementations
//!
//! A plan gets exactly one branch (named by [`crate::branch::branch_name`])
//! and at most one worktree, created next to the main checkout as
//! `<parent>/<repo-name>-<branch>`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::branch::{branch_name, is_implementation_branch};
use crate::context::WorkflowContext;
use crate::error::ImplflowError;
use crate::exec::CommandRunner;
use crate::types::{Branch, CleanStatus, Worktree};

/// Result of removing a worktree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeRemoval {
    pub path: PathBuf,
    /// Whether the plain removal failed and `--force` was needed
    pub forced: bool,
}

/// Result of creating a branch in the current checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSwitch {
    pub branch: Branch,
    pub previous: String,
}

/// Creates, inspects and removes plan worktrees
pub struct WorktreeManager<'a> {
    ctx: &'a WorkflowContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> WorktreeManager<'a> {
    pub fn new(ctx: &'a WorkflowContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    /// Where the worktree for `branch` lives, next to the main checkout
    pub fn worktree_path(&self, branch: &str) -> Result<PathBuf, ImplflowError> {
        let root = self
            .ctx
            .git(self.runner, &self.ctx.repo_root)
            .main_repo_root()?;
        let repo_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ImplflowError::NotAGitRepository { path: root.clone() })?;
        let parent = root.parent().unwrap_or(&root);
        Ok(parent.join(format!("{}-{}", repo_name, branch)))
    }

    /// Create the branch and worktree for a plan.
    ///
    /// Fails with `BranchAlreadyExists` if the branch exists and with
    /// `PathConflict` if the target directory exists. Never reuses either.
    pub fn create(&self, plan_dir: &Path) -> Result<Worktree, ImplflowError> {
        let name = branch_name(plan_dir)?;
        let git = self.ctx.git(self.runner, &self.ctx.repo_root);
        let repo_root = git.main_repo_root()?;

        if git.branch_exists(&name)? {
            return Err(ImplflowError::BranchAlreadyExists { branch: name });
        }

        let path = self.worktree_path(&name)?;
        if path.exists() {
            return Err(ImplflowError::PathConflict { path });
        }

        let base = self.ctx.base_branch.as_str();
        git.at(&repo_root).worktree_add_new_branch(&path, &name, base)?;
        tracing::info!(branch = %name, path = %path.display(), %base, "worktree created");

        Ok(Worktree {
            path,
            branch: Branch {
                name,
                base: base.to_string(),
            },
            repo_root,
        })
    }

    /// Remove a worktree, retrying once with `--force`
    pub fn remove(&self, path: &Path) -> Result<WorktreeRemoval, ImplflowError> {
        if !path.is_dir() {
            return Err(ImplflowError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let path = path.canonicalize()?;

        // Run from the main checkout so the worktree directory can go away
        let repo_root = self.ctx.git(self.runner, &path).main_repo_root()?;
        let git = self.ctx.git(self.runner, &repo_root);

        let forced = match git.worktree_remove(&path, false) {
            Ok(()) => false,
            Err(first) => {
                tracing::warn!(path = %path.display(), error = %first, "worktree removal failed, retrying with --force");
                git.worktree_remove(&path, true)?;
                if let Err(e) = git.worktree_prune() {
                    tracing::debug!(error = %e, "worktree prune failed");
                }
                true
            }
        };

        tracing::info!(path = %path.display(), forced, "worktree removed");
        Ok(WorktreeRemoval { path, forced })
    }

    /// Classify the working tree at `dir`
    pub fn check_clean(&self, dir: &Path) -> Result<CleanStatus, ImplflowError> {
        let git = self.ctx.git(self.runner, dir);
        git.show_toplevel()?;

        let modified = git.diff_names(false)?;
        let staged = git.diff_names(true)?;
        let untracked = git.untracked()?;
        let current_branch = match git.current_branch() {
            Ok(branch) => Some(branch),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "could not read current branch");
                None
            }
        };

        Ok(CleanStatus {
            clean: modified.is_empty() && staged.is_empty() && untracked.is_empty(),
            is_implementation_branch: current_branch
                .as_deref()
                .is_some_and(is_implementation_branch),
            modified,
            staged,
            untracked,
            current_branch,
        })
    }

    /// Confirm `dir` is on the branch derived from `plan_dir`.
    ///
    /// Returns the branch name on a match. Never switches branches.
    pub fn check_branch(&self, dir: &Path, plan_dir: &Path) -> Result<String, ImplflowError> {
        let expected = branch_name(plan_dir)?;
        let actual = self.ctx.git(self.runner, dir).current_branch()?;
        if actual != expected {
            return Err(ImplflowError::BranchMismatch { expected, actual });
        }
        Ok(expected)
    }

    /// Create the plan branch in the current checkout instead of a worktree
    pub fn create_branch(&self, dir: &Path, plan_dir: &Path) -> Result<BranchSwitch, ImplflowError> {
        let name = branch_name(plan_dir)?;
        let git = self.ctx.git(self.runner, dir);

        if git.branch_exists(&name)? {
            return Err(ImplflowError::BranchAlreadyExists { branch: name });
        }

        let previous = git.current_branch()?;
        let base = self.ctx.base_branch.as_str();
        git.checkout_new_branch(&name, base)?;
        tracing::info!(branch = %name, %base, %previous, "branch created");

        Ok(BranchSwitch {
            branch: Branch {
                name,
                base: base.to_string(),
            },
            previous,
        })
    }
}
