//! Phase commits
//!
//! Commit messages are never free-form: they are synthesized from the plan
//! so every commit traces back to its phase, plan file and issue.

use std::path::Path;

use crate::context::WorkflowContext;
use crate::error::ImplflowError;
use crate::exec::CommandRunner;
use crate::git::GitCli;
use crate::parser::find_phase;
use crate::plan::PlanDirectory;
use crate::types::{Commit, CommitOutcome};

/// Build the commit message for a phase.
///
/// ```text
/// Phase <N>: <name>
///
/// <description>
///
/// Plan: <plan path>
/// Issue: #<n>
/// ```
///
/// The description and issue lines are omitted when unknown. A plan without
/// the phase header still yields `Phase <N>` so the commit can proceed.
pub fn phase_commit_message(
    plan: &str,
    number: u32,
    plan_path: &str,
    issue: Option<u64>,
) -> String {
    let mut message = match find_phase(plan, number) {
        Some((name, description)) => {
            let mut header = format!("Phase {}: {}", number, name);
            if let Some(description) = description {
                header.push_str("\n\n");
                header.push_str(&description);
            }
            header
        }
        None => {
            tracing::warn!(phase = number, plan = plan_path, "phase header not found in plan");
            format!("Phase {}", number)
        }
    };

    message.push_str("\n\nPlan: ");
    message.push_str(plan_path);
    if let Some(issue) = issue {
        message.push_str(&format!("\nIssue: #{}", issue));
    }
    message
}

/// Commit message for adding a plan directory
pub fn plan_files_message(plan_dir: &Path) -> String {
    let resolved = plan_dir
        .canonicalize()
        .unwrap_or_else(|_| plan_dir.to_path_buf());
    let name = resolved
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let under_issues = resolved
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|p| p == "issues");

    match name.parse::<u64>() {
        Ok(issue) if under_issues => format!("Add implementation plan for issue #{}", issue),
        _ => format!("Add implementation plan: {}", name),
    }
}

/// Stages and commits work for a plan
pub struct PhaseCommitBuilder<'a> {
    ctx: &'a WorkflowContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> PhaseCommitBuilder<'a> {
    pub fn new(ctx: &'a WorkflowContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    /// Stage everything in `dir` and commit it as `phase` of the plan.
    ///
    /// Returns [`CommitOutcome::NoOp`] when nothing is staged.
    pub fn commit_phase(
        &self,
        dir: &Path,
        plan_dir: &Path,
        phase: u32,
    ) -> Result<CommitOutcome, ImplflowError> {
        let plan = PlanDirectory::open(plan_dir)?;
        let (plan_path, content) = match plan.files.plan.as_deref() {
            Some(file) => (file, std::fs::read_to_string(file)?),
            None => {
                tracing::warn!(
                    plan_dir = %plan_dir.display(),
                    "no plan document, commit message uses the phase number only"
                );
                (plan_dir, String::new())
            }
        };

        let display_path = relative_to(plan_path, &[dir, &self.ctx.repo_root]);
        let message = phase_commit_message(&content, phase, &display_path, plan.issue_number);

        let git = self.ctx.git(self.runner, dir);
        git.add_all()?;
        self.commit_staged(&git, message)
    }

    /// Stage the plan directory and commit it
    pub fn commit_plan_files(&self, dir: &Path, plan_dir: &Path) -> Result<CommitOutcome, ImplflowError> {
        if !plan_dir.is_dir() {
            return Err(ImplflowError::PlanNotFound {
                path: plan_dir.to_path_buf(),
            });
        }
        let git = self.ctx.git(self.runner, dir);
        git.add_path(plan_dir)?;
        self.commit_staged(&git, plan_files_message(plan_dir))
    }

    fn commit_staged(&self, git: &GitCli<'_>, message: String) -> Result<CommitOutcome, ImplflowError> {
        if !git.has_staged_changes()? {
            tracing::info!(dir = %git.dir().display(), "nothing staged, no commit created");
            return Ok(CommitOutcome::NoOp);
        }

        git.commit(&message)?;
        let hash = git.head_hash()?;
        let stats = git.show_stat().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read commit stats");
            String::new()
        });
        tracing::info!(%hash, "commit created");

        Ok(CommitOutcome::Committed(Commit {
            hash,
            message,
            stats,
        }))
    }
}

/// `path` relative to the first base that contains it, else as given
fn relative_to(path: &Path, bases: &[&Path]) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    bases
        .iter()
        .filter_map(|base| base.canonicalize().ok())
        .find_map(|base| resolved.strip_prefix(&base).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
