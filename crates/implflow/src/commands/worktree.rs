//! Worktree and branch commands
//!
//! Provides subcommands for creating, removing and finishing plan worktrees,
//! plus the checkout guards (`check-clean`, `check-branch`, `create-branch`).

use std::path::PathBuf;

use clap::Subcommand;
use owo_colors::OwoColorize;
use serde::Serialize;

use implflow_core::publish::FinalizeOutcome;
use implflow_core::{
    CleanStatus, PullRequestPublisher, SystemRunner, Worktree, WorktreeManager,
    worktree::{BranchSwitch, WorktreeRemoval},
};

use super::{Invocation, setup_error};
use crate::colors::PALETTE;
use crate::commands::pr::PrArgs;
use crate::output::JsonIssue;

/// Worktree subcommands
#[derive(Subcommand, Debug)]
pub enum WorktreeCommands {
    /// Create a worktree and branch for a plan
    #[command(
        long_about = "Create a worktree and branch for a plan.\n\nCreates:\n  - Branch: derived from the plan (see `implflow branch-name`)\n  - Worktree: <parent of repo>/<repo name>-<branch>\n\nFails if the branch or the worktree directory already exists."
    )]
    Create {
        /// Plan directory
        plan_dir: PathBuf,

        /// Base branch (default: from config)
        #[arg(long)]
        base: Option<String>,
    },

    /// Remove a worktree
    Remove {
        /// Worktree path
        path: PathBuf,
    },

    /// Push, optionally open a PR, then remove the worktree
    #[command(
        long_about = "Finish a worktree.\n\nSteps:\n  1. Push the branch with upstream tracking (skip with --no-push)\n  2. With --create-pr, open a pull request; failure is reported, not fatal\n  3. Remove the worktree, retrying once with --force\n\nWithout --plan, the first *-plan.md under the worktree's docs directory is used."
    )]
    Cleanup {
        /// Worktree path
        path: PathBuf,

        /// Open a pull request before removing
        #[arg(long)]
        create_pr: bool,

        /// Skip pushing to the remote
        #[arg(long)]
        no_push: bool,

        #[command(flatten)]
        pr: PrArgs,
    },
}

/// JSON output for worktree create
#[derive(Serialize)]
pub struct CreateData {
    pub worktree_path: String,
    pub branch_name: String,
    pub base_branch: String,
    pub repo_root: String,
}

impl From<&Worktree> for CreateData {
    fn from(wt: &Worktree) -> Self {
        Self {
            worktree_path: wt.path.display().to_string(),
            branch_name: wt.branch.name.clone(),
            base_branch: wt.branch.base.clone(),
            repo_root: wt.repo_root.display().to_string(),
        }
    }
}

/// JSON output for check-branch
#[derive(Serialize)]
pub struct CheckBranchData {
    pub branch_name: String,
    pub matches: bool,
}

/// Run a worktree subcommand
pub fn run_worktree(inv: &Invocation, command: WorktreeCommands) -> Result<i32, String> {
    match command {
        WorktreeCommands::Create { plan_dir, base } => run_worktree_create(inv, plan_dir, base),
        WorktreeCommands::Remove { path } => run_worktree_remove(inv, path),
        WorktreeCommands::Cleanup {
            path,
            create_pr,
            no_push,
            pr,
        } => run_worktree_cleanup(inv, path, create_pr, no_push, pr),
    }
}

fn run_worktree_create(
    inv: &Invocation,
    plan_dir: PathBuf,
    base: Option<String>,
) -> Result<i32, String> {
    let ctx = inv.context(Some(&plan_dir), base).map_err(setup_error)?;
    let manager = WorktreeManager::new(&ctx, &SystemRunner);
    let result = ctx
        .plan_dir()
        .and_then(|dir| manager.create(dir))
        .map(|wt| CreateData::from(&wt));

    inv.output.finish("worktree-create", result, vec![], |data| {
        println!("Created worktree on branch {}", data.branch_name.style(PALETTE.branch));
        println!("  Path: {}", data.worktree_path);
        println!("  Base: {}", data.base_branch);
    })
}

fn run_worktree_remove(inv: &Invocation, path: PathBuf) -> Result<i32, String> {
    let ctx = inv.context(None, None).map_err(setup_error)?;
    let path = inv.absolute(&path).map_err(setup_error)?;
    let result: Result<WorktreeRemoval, _> = WorktreeManager::new(&ctx, &SystemRunner).remove(&path);

    inv.output.finish("worktree-remove", result, vec![], |data| {
        let how = if data.forced { " (forced)" } else { "" };
        println!("Removed worktree {}{}", data.path.display(), how);
    })
}

fn run_worktree_cleanup(
    inv: &Invocation,
    path: PathBuf,
    create_pr: bool,
    no_push: bool,
    pr: PrArgs,
) -> Result<i32, String> {
    let path = inv.absolute(&path).map_err(setup_error)?;
    let ctx = inv
        .context(pr.plan.as_deref(), pr.base.clone())
        .map_err(setup_error)?;
    let options = pr.options(&ctx);

    let result: Result<FinalizeOutcome, _> = PullRequestPublisher::new(&ctx, &SystemRunner)
        .finalize(&path, !no_push, create_pr, &options);
    let issues = match &result {
        Ok(outcome) => outcome
            .publish
            .pr_error
            .iter()
            .map(|e| JsonIssue::warning("W002", format!("pull request not created: {}", e)))
            .collect(),
        Err(_) => vec![],
    };

    inv.output.finish("worktree-cleanup", result, issues, |data| {
        if data.publish.pushed {
            println!("Pushed {}", data.publish.branch.style(PALETTE.branch));
        }
        if let Some(pr) = &data.publish.pull_request {
            println!("Pull request: {}", pr.url.style(PALETTE.done));
        }
        println!("Removed worktree {}", data.removal.path.display());
    })
}

/// Run the check-clean command
pub fn run_check_clean(inv: &Invocation, dir: Option<PathBuf>) -> Result<i32, String> {
    let ctx = inv.context(None, None).map_err(setup_error)?;
    let dir = inv.work_dir(&ctx, dir.as_deref()).map_err(setup_error)?;
    let result: Result<CleanStatus, _> = WorktreeManager::new(&ctx, &SystemRunner).check_clean(&dir);

    inv.output.finish("check-clean", result, vec![], |status| {
        if status.clean {
            println!("{}", "Working tree clean".style(PALETTE.done));
        } else {
            for (label, files) in [
                ("modified", &status.modified),
                ("staged", &status.staged),
                ("untracked", &status.untracked),
            ] {
                for file in files {
                    println!("  {:<10} {}", label, file);
                }
            }
        }
        if let Some(branch) = &status.current_branch {
            println!("Branch: {}", branch);
        }
    })
}

/// Run the check-branch command
pub fn run_check_branch(
    inv: &Invocation,
    plan_dir: PathBuf,
    dir: Option<PathBuf>,
) -> Result<i32, String> {
    let ctx = inv.context(Some(&plan_dir), None).map_err(setup_error)?;
    let dir = inv.work_dir(&ctx, dir.as_deref()).map_err(setup_error)?;
    let manager = WorktreeManager::new(&ctx, &SystemRunner);
    let result = ctx
        .plan_dir()
        .and_then(|plan| manager.check_branch(&dir, plan))
        .map(|branch_name| CheckBranchData {
            branch_name,
            matches: true,
        });

    inv.output.finish("check-branch", result, vec![], |data| {
        println!("On expected branch {}", data.branch_name.style(PALETTE.done));
    })
}

/// Run the create-branch command
pub fn run_create_branch(
    inv: &Invocation,
    plan_dir: PathBuf,
    base: Option<String>,
    dir: Option<PathBuf>,
) -> Result<i32, String> {
    let ctx = inv.context(Some(&plan_dir), base).map_err(setup_error)?;
    let dir = inv.work_dir(&ctx, dir.as_deref()).map_err(setup_error)?;
    let manager = WorktreeManager::new(&ctx, &SystemRunner);
    let result: Result<BranchSwitch, _> = ctx
        .plan_dir()
        .and_then(|plan| manager.create_branch(&dir, plan));

    inv.output.finish("create-branch", result, vec![], |data| {
        println!(
            "Created branch {} from {} (was on {})",
            data.branch.name.style(PALETTE.branch),
            data.branch.base,
            data.previous
        );
    })
}
