//! implflow-core: plan parsing, branch naming, and git workflow operations
//!
//! This crate provides the plan document model and the git/GitHub workflow
//! built on top of it. All external tools are reached through
//! [`exec::CommandRunner`].

/// Core error types for implflow operations
pub mod error;

/// Configuration handling
pub mod config;

/// Core data types (Phase, Task, Progress, Worktree, etc.)
pub mod types;

/// Explicit per-invocation context
pub mod context;

/// External command execution
pub mod exec;

/// Git and GitHub CLI wrappers
pub mod gh;
pub mod git;

/// Branch naming
pub mod branch;

/// Plan document parsing and editing
pub mod editor;
pub mod parser;
pub mod plan;

/// Worktree lifecycle
pub mod worktree;

/// Phase commits
pub mod commit;

/// New plan directories
pub mod scaffold;

/// Pull request publishing
pub mod publish;
pub mod templates;

// Re-exports for convenience
pub use branch::{branch_name, slugify};
pub use commit::PhaseCommitBuilder;
pub use config::Config;
pub use context::WorkflowContext;
pub use error::ImplflowError;
pub use exec::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use plan::{PlanDirectory, PlanDocument, PlanReport};
pub use publish::{PublishOptions, PullRequestPublisher};
pub use scaffold::{PlanKind, PlanScaffold, init_plan};
pub use templates::ChangeType;
pub use types::{
    Branch, CleanStatus, Commit, CommitOutcome, Phase, Progress, PullRequest, SuccessCriteria,
    Task, TaskStatus, Worktree,
};
pub use worktree::WorktreeManager;
