//! Push and pull request publishing
//!
//! Sequencing is strict: the push must succeed before a PR is attempted.
//! PR creation failures are recorded on the outcome instead of aborting, since
//! the branch is already on the remote and a PR can be opened by hand.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::context::WorkflowContext;
use crate::error::ImplflowError;
use crate::exec::CommandRunner;
use crate::gh::PrRequest;
use crate::parser::{extract_title, parse_phases, parse_success_criteria};
use crate::plan::{PlanDirectory, PlanFiles};
use crate::templates::ChangeType;
use crate::types::{Phase, PullRequest, SuccessCriteria};
use crate::worktree::{WorktreeManager, WorktreeRemoval};

/// Title used when the plan has no level-1 heading
pub const FALLBACK_TITLE: &str = "Implementation";

/// What a plan contributes to a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub title: String,
    pub phases: Vec<Phase>,
    pub issue_number: Option<u64>,
    /// Plan file path relative to the plan directory's parent
    pub plan_file: String,
    pub testing: SuccessCriteria,
}

impl PlanSummary {
    pub fn load(plan_dir: &Path) -> Result<Self, ImplflowError> {
        let dir = PlanDirectory::open(plan_dir)?;
        let plan_file = dir.plan_file()?;
        let content = std::fs::read_to_string(plan_file)?;

        let relative = plan_dir
            .parent()
            .and_then(|parent| plan_file.strip_prefix(parent).ok())
            .unwrap_or(plan_file);

        Ok(Self {
            title: extract_title(&content).unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            phases: parse_phases(&content),
            issue_number: dir.issue_number,
            plan_file: relative.display().to_string(),
            testing: parse_success_criteria(&content),
        })
    }

    /// Render the PR body
    pub fn body(&self) -> String {
        let mut parts = vec![format!("# {}", self.title), String::new()];

        if !self.phases.is_empty() {
            parts.push("## Summary".to_string());
            for phase in &self.phases {
                parts.push(format!("- Implemented Phase {}: {}", phase.number, phase.name));
            }
            parts.push(String::new());
        }

        parts.push("## Plan".to_string());
        parts.push(format!("[Implementation Plan]({})", self.plan_file));
        parts.push(String::new());

        parts.push("## Testing".to_string());
        for (heading, items) in [
            ("### Automated", &self.testing.automated),
            ("### Manual Verification", &self.testing.manual),
        ] {
            if items.is_empty() {
                continue;
            }
            parts.push(heading.to_string());
            parts.extend(items.iter().map(|item| format!("- [ ] {}", item)));
            parts.push(String::new());
        }

        if let Some(issue) = self.issue_number {
            parts.push("## Related".to_string());
            parts.push(format!("Closes #{}", issue));
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// PR body from a change-type template and the branch's commit subjects
pub fn generic_body(change_type: ChangeType, commits: &[String]) -> String {
    let mut body = change_type.template().to_string();
    if !commits.is_empty() {
        body.push_str("\n## Commits\n");
        for subject in commits {
            body.push_str(&format!("- {}\n", subject));
        }
    }
    body
}

/// How to build a pull request
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Plan to describe; the generic template is used when absent
    pub plan_dir: Option<PathBuf>,
    pub change_type: ChangeType,
    /// Overrides the derived title
    pub title: Option<String>,
    pub draft: bool,
}

/// Result of push + PR
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub branch: String,
    pub pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequest>,
    /// Why PR creation failed, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_error: Option<String>,
}

/// Result of finishing a worktree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeOutcome {
    #[serde(flatten)]
    pub publish: PublishOutcome,
    pub removal: WorktreeRemoval,
}

/// Pushes branches and opens pull requests
pub struct PullRequestPublisher<'a> {
    ctx: &'a WorkflowContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> PullRequestPublisher<'a> {
    pub fn new(ctx: &'a WorkflowContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    /// Push the branch checked out in `dir` with upstream tracking
    pub fn push(&self, dir: &Path) -> Result<String, ImplflowError> {
        let git = self.ctx.git(self.runner, dir);
        let branch = git.current_branch()?;
        git.push_upstream(&self.ctx.settings.remote, &branch)?;
        tracing::info!(%branch, remote = %self.ctx.settings.remote, "branch pushed");
        Ok(branch)
    }

    /// Title and body for a PR from `branch`
    pub fn describe(
        &self,
        dir: &Path,
        branch: &str,
        options: &PublishOptions,
    ) -> Result<(String, String), ImplflowError> {
        let (title, body) = match &options.plan_dir {
            Some(plan_dir) => {
                let summary = PlanSummary::load(plan_dir)?;
                let body = summary.body();
                (summary.title, body)
            }
            None => {
                let commits = self
                    .ctx
                    .git(self.runner, dir)
                    .log_subjects(&self.ctx.base_branch, branch);
                (
                    format!("Update from {}", branch),
                    generic_body(options.change_type, &commits),
                )
            }
        };
        Ok((options.title.clone().unwrap_or(title), body))
    }

    /// Open a PR for the branch checked out in `dir`, without pushing
    pub fn create_pr(&self, dir: &Path, options: &PublishOptions) -> Result<PullRequest, ImplflowError> {
        let branch = self.ctx.git(self.runner, dir).current_branch()?;
        self.open_pr(dir, &branch, options)
    }

    fn open_pr(
        &self,
        dir: &Path,
        branch: &str,
        options: &PublishOptions,
    ) -> Result<PullRequest, ImplflowError> {
        let (title, body) = self.describe(dir, branch, options)?;
        let url = self.ctx.gh(self.runner, dir).create_pr(&PrRequest {
            title: &title,
            body: &body,
            base: &self.ctx.base_branch,
            head: branch,
            draft: options.draft,
        })?;
        tracing::info!(%url, "pull request created");

        Ok(PullRequest {
            title,
            body,
            url,
            base: self.ctx.base_branch.clone(),
            head: branch.to_string(),
            draft: options.draft,
        })
    }

    /// Push, then open a PR. Only the push is fatal.
    pub fn publish(&self, dir: &Path, options: &PublishOptions) -> Result<PublishOutcome, ImplflowError> {
        let branch = self.push(dir)?;
        let mut outcome = PublishOutcome {
            branch,
            pushed: true,
            pull_request: None,
            pr_error: None,
        };
        self.try_open_pr(dir, options, &mut outcome);
        Ok(outcome)
    }

    fn try_open_pr(&self, dir: &Path, options: &PublishOptions, outcome: &mut PublishOutcome) {
        match self.open_pr(dir, &outcome.branch, options) {
            Ok(pr) => outcome.pull_request = Some(pr),
            Err(e) => {
                tracing::warn!(branch = %outcome.branch, error = %e, "pull request not created");
                outcome.pr_error = Some(e.to_string());
            }
        }
    }

    /// Finish a worktree: push, optionally open a PR, then remove it.
    ///
    /// Without an explicit plan directory the first plan found under the
    /// worktree's docs directory is used for the PR body.
    pub fn finalize(
        &self,
        worktree: &Path,
        push: bool,
        create_pr: bool,
        options: &PublishOptions,
    ) -> Result<FinalizeOutcome, ImplflowError> {
        if !worktree.is_dir() {
            return Err(ImplflowError::NotFound {
                path: worktree.to_path_buf(),
            });
        }

        let git = self.ctx.git(self.runner, worktree);
        let mut publish = PublishOutcome {
            branch: git.current_branch()?,
            pushed: false,
            pull_request: None,
            pr_error: None,
        };

        if push {
            self.push(worktree)?;
            publish.pushed = true;
        }

        if create_pr {
            let mut options = options.clone();
            if options.plan_dir.is_none() {
                options.plan_dir =
                    detect_plan_dir(&worktree.join(&self.ctx.settings.docs_dir));
            }
            self.try_open_pr(worktree, &options, &mut publish);
        }

        let removal = WorktreeManager::new(self.ctx, self.runner).remove(worktree)?;
        Ok(FinalizeOutcome { publish, removal })
    }
}

/// Directory of the first `*-plan.md` found under `docs_dir`
pub fn detect_plan_dir(docs_dir: &Path) -> Option<PathBuf> {
    if !docs_dir.is_dir() {
        return None;
    }
    if let Some(plan) = PlanFiles::matching(docs_dir, "-plan.md").into_iter().next() {
        return plan.parent().map(Path::to_path_buf);
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(docs_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs.iter().find_map(|dir| detect_plan_dir(dir))
}
