//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use implflow_core::PlanKind;

use crate::commands::{ContextCommands, PrArgs, TaskCommands, WorktreeCommands};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// implflow - plan-driven implementation workflow
#[derive(Parser)]
#[command(name = "implflow")]
#[command(version = VERSION)]
#[command(about = "Plan-driven implementation workflow: branches, worktrees, phase commits and pull requests")]
#[command(long_about = "implflow turns an implementation plan directory into git workflow steps.\n\nA plan directory holds *-plan.md, *-tasks.md and optionally *-context.md and *-research.md.\nFrom it implflow derives a deterministic branch name, creates an isolated worktree, tracks task\nprogress in the markdown, commits each phase with a traceable message, and publishes a pull request.\n\nEvery command supports --json for a single machine-readable result envelope.")]
pub struct Cli {
    /// Increase output verbosity (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Repository to operate on (default: current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a plan directory with skeleton documents
    #[command(long_about = "Create a plan directory with skeleton documents.\n\nLayout (under the configured docs directory, default .docs):\n  issue:  issues/<n>/<n>-plan.md, -tasks.md, -context.md, -research.md\n  adhoc:  adhoc/<name>/<name>-plan.md, ...\n\nFails if any of the documents already exists unless --force is given.")]
    Init {
        /// Issue number, or a name for ad-hoc plans
        id: String,

        /// issue or adhoc
        #[arg(long = "type", default_value = "issue")]
        plan_type: PlanKind,

        /// Overwrite existing documents
        #[arg(long)]
        force: bool,
    },

    /// Print the branch name derived from a plan directory
    #[command(long_about = "Print the branch name derived from a plan directory.\n\nRules:\n  issue-<n>-<title-slug>  plan under issues/<n>/ or named <n>-*-plan.md, with a # title\n  issue-<n>               same, but the plan has no # title\n  feature-<dir-slug>      ad-hoc plan directory\n\nThe title slug is truncated to 40 characters.")]
    BranchName {
        /// Plan directory
        plan_dir: PathBuf,
    },

    /// Show phases, tasks, success criteria and progress for a plan
    #[command(visible_alias = "parse")]
    Status {
        /// Plan directory
        plan_dir: PathBuf,
    },

    /// Task checkbox commands
    #[command(subcommand)]
    Task(TaskCommands),

    /// Context document commands
    #[command(subcommand)]
    Context(ContextCommands),

    /// Worktree lifecycle commands
    #[command(subcommand, long_about = "Worktree lifecycle commands.\n\nSubcommands:\n  create   Create <parent>/<repo>-<branch> on a new plan branch\n  remove   Remove a worktree (retries once with --force)\n  cleanup  Push, optionally open a PR, then remove the worktree")]
    Worktree(WorktreeCommands),

    /// Report modified, staged and untracked files
    CheckClean {
        /// Working tree to inspect (default: repository root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Verify the current branch matches the plan's branch
    CheckBranch {
        /// Plan directory
        plan_dir: PathBuf,

        /// Working tree to inspect (default: repository root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Create the plan branch in the current checkout
    CreateBranch {
        /// Plan directory
        plan_dir: PathBuf,

        /// Base branch (default: from config)
        #[arg(long)]
        base: Option<String>,

        /// Checkout to create the branch in (default: repository root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Stage all changes and commit them as a plan phase
    #[command(long_about = "Stage all changes and commit them as a plan phase.\n\nMessage format:\n  Phase <N>: <name>\n\n  <description>\n\n  Plan: <plan file>\n  Issue: #<n>\n\nNothing is committed when there are no changes.")]
    CommitPhase {
        /// Plan directory
        plan_dir: PathBuf,

        /// Phase number
        #[arg(long)]
        phase: u32,

        /// Worktree to commit in (default: repository root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Commit the plan directory itself
    CommitPlan {
        /// Plan directory
        plan_dir: PathBuf,

        /// Checkout to commit in (default: repository root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Open a pull request for the current branch (no push)
    Pr(PrArgs),

    /// Push the current branch, then open a pull request
    #[command(long_about = "Push the current branch with upstream tracking, then open a pull request.\n\nA failed push stops here. A failed PR is reported as pr_error with exit code 0,\nsince the branch is already on the remote.")]
    Publish(PrArgs),

    /// Print the pull request template for a change type
    PrTemplate {
        /// feature, bugfix, docs, refactor or chore
        #[arg(default_value = "feature")]
        change_type: implflow_core::ChangeType,
    },
}

/// Get the command args for use in the application
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use implflow_core::TaskStatus;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_update() {
        let cli = Cli::try_parse_from([
            "implflow", "--json", "task", "update", ".docs/issues/42", "--pattern", "Add tests",
            "--status", "done",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Task(TaskCommands::Update { pattern, status, dry_run, .. })) => {
                assert_eq!(pattern, "Add tests");
                assert_eq!(status, TaskStatus::Done);
                assert!(!dry_run);
            }
            _ => panic!("expected task update"),
        }
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from(["implflow", "init", "retry-cleanup", "--type", "adhoc"]).unwrap();
        match cli.command {
            Some(Commands::Init { id, plan_type, force }) => {
                assert_eq!(id, "retry-cleanup");
                assert_eq!(plan_type, PlanKind::Adhoc);
                assert!(!force);
            }
            _ => panic!("expected init"),
        }
        assert!(Cli::try_parse_from(["implflow", "init", "4", "--type", "epic"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_change_type() {
        assert!(Cli::try_parse_from(["implflow", "pr-template", "hotfix"]).is_err());
    }
}
