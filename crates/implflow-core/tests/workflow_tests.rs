//! Integration tests for the plan workflow against real git repositories

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use implflow_core::config::ImplflowConfig;
use implflow_core::{
    CommitOutcome, Config, ImplflowError, PhaseCommitBuilder, PlanReport, SystemRunner,
    WorkflowContext, WorktreeManager, branch_name,
};

const PLAN: &str = "# Add Retry Logic

## Overview
Retry failed uploads.

## Phase 1: Foundation
Introduce the retry policy type.

## Phase 2: Integration
Wire the policy into the uploader.

## Success Criteria
### Automated
- [ ] `cargo test` passes
### Manual
- [ ] Upload survives a flaky network
";

const TASKS: &str = "# Tasks

## Phase 1: Foundation
- [x] Define RetryPolicy
- [x] Add backoff calculation

## Phase 2: Integration
- [ ] Call policy from uploader
- [ ] Log retry attempts
";

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create `<tmp>/repo` with one commit on `main`; worktrees land beside it
fn setup_repo() -> (tempfile::TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let repo = temp.path().join("repo");
    fs::create_dir(&repo).unwrap();

    git(&repo, &["init", "-b", "main"]);
    git(&repo, &["config", "user.name", "Test User"]);
    git(&repo, &["config", "user.email", "test@example.com"]);
    fs::write(repo.join("README.md"), "# repo\n").unwrap();
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "Initial commit"]);

    let repo = repo.canonicalize().unwrap();
    (temp, repo)
}

/// Write docs/issues/42 with plan and tasks documents
fn write_plan(repo: &Path) -> PathBuf {
    let plan_dir = repo.join("docs").join("issues").join("42");
    fs::create_dir_all(&plan_dir).unwrap();
    fs::write(plan_dir.join("42-plan.md"), PLAN).unwrap();
    fs::write(plan_dir.join("42-tasks.md"), TASKS).unwrap();
    fs::write(plan_dir.join("42-context.md"), "# Context\n\n## Decisions\n").unwrap();
    plan_dir
}

fn context(repo: &Path, plan_dir: &Path) -> WorkflowContext {
    WorkflowContext::new(repo, &Config::default()).with_plan_dir(Some(plan_dir.to_path_buf()))
}

#[test]
fn test_issue_plan_end_to_end() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    let ctx = context(&repo, &plan_dir);
    let runner = SystemRunner;

    let expected = "issue-42-add-retry-logic";
    assert_eq!(branch_name(&plan_dir).unwrap(), expected);

    let report = PlanReport::load(&plan_dir).unwrap();
    assert_eq!(report.progress.total, 4);
    assert_eq!(report.progress.completed, 2);
    assert_eq!(report.progress.completion_percentage, 50.0);
    assert!(report.warnings.is_empty());

    let outcome = PhaseCommitBuilder::new(&ctx, &runner)
        .commit_plan_files(&repo, &plan_dir)
        .unwrap();
    let commit = outcome.commit().expect("plan files should be committed");
    assert_eq!(commit.message, "Add implementation plan for issue #42");

    let manager = WorktreeManager::new(&ctx, &runner);
    let worktree = manager.create(&plan_dir).unwrap();
    assert_eq!(worktree.branch.name, expected);
    assert_eq!(worktree.branch.base, "main");
    assert_eq!(
        worktree.path,
        repo.parent().unwrap().join(format!("repo-{}", expected))
    );
    assert!(worktree.path.join("docs/issues/42/42-plan.md").is_file());
    assert_eq!(git(&worktree.path, &["rev-parse", "--abbrev-ref", "HEAD"]), expected);

    // Work happens in the worktree and is committed as phase 1
    fs::write(worktree.path.join("retry.rs"), "pub struct RetryPolicy;\n").unwrap();
    assert!(!manager.check_clean(&worktree.path).unwrap().clean);
    assert_eq!(manager.check_branch(&worktree.path, &plan_dir).unwrap(), expected);

    let outcome = PhaseCommitBuilder::new(&ctx, &runner)
        .commit_phase(&worktree.path, &plan_dir, 1)
        .unwrap();
    let commit = outcome.commit().expect("phase work should be committed");
    assert!(commit.message.starts_with("Phase 1: Foundation"));
    assert!(commit.message.contains("Plan: docs/issues/42/42-plan.md"));
    assert!(commit.message.ends_with("Issue: #42"));
    assert_eq!(git(&worktree.path, &["rev-parse", "HEAD"]), commit.hash);
    assert!(manager.check_clean(&worktree.path).unwrap().clean);

    let removal = manager.remove(&worktree.path).unwrap();
    assert!(!removal.forced);
    assert!(!worktree.path.exists());
    // The branch and its commit outlive the worktree
    assert_eq!(git(&repo, &["rev-parse", expected]), commit.hash);
}

#[test]
fn test_commit_phase_without_changes_is_noop() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "Add plan"]);
    let ctx = context(&repo, &plan_dir);

    let before = git(&repo, &["rev-parse", "HEAD"]);
    let outcome = PhaseCommitBuilder::new(&ctx, &SystemRunner)
        .commit_phase(&repo, &plan_dir, 1)
        .unwrap();

    assert_eq!(outcome, CommitOutcome::NoOp);
    assert_eq!(git(&repo, &["rev-parse", "HEAD"]), before);
}

#[cfg(unix)]
#[test]
fn test_commit_phase_outlasts_command_timeout() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    let hook = repo.join(".git").join("hooks").join("pre-commit");
    fs::write(&hook, "#!/bin/sh\nsleep 2\n").unwrap();
    fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();

    let config = Config {
        implflow: ImplflowConfig {
            command_timeout_secs: 1,
            ..ImplflowConfig::default()
        },
    };
    let ctx = WorkflowContext::new(&repo, &config).with_plan_dir(Some(plan_dir.clone()));

    let outcome = PhaseCommitBuilder::new(&ctx, &SystemRunner)
        .commit_phase(&repo, &plan_dir, 1)
        .unwrap();
    let commit = outcome.commit().expect("slow hook should not abort the commit");
    assert_eq!(git(&repo, &["rev-parse", "HEAD"]), commit.hash);
}

#[test]
fn test_commit_phase_missing_header_still_commits() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "Add plan"]);
    let ctx = context(&repo, &plan_dir);

    fs::write(repo.join("extra.txt"), "more\n").unwrap();
    let outcome = PhaseCommitBuilder::new(&ctx, &SystemRunner)
        .commit_phase(&repo, &plan_dir, 7)
        .unwrap();

    let commit = outcome.commit().expect("work should be committed");
    assert!(commit.message.starts_with("Phase 7\n\nPlan: "));
}

#[test]
fn test_second_worktree_for_same_plan_is_rejected() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    let ctx = context(&repo, &plan_dir);
    let manager = WorktreeManager::new(&ctx, &SystemRunner);

    let first = manager.create(&plan_dir).unwrap();
    let err = manager.create(&plan_dir).unwrap_err();
    assert!(
        matches!(err, ImplflowError::BranchAlreadyExists { ref branch } if branch == "issue-42-add-retry-logic"),
        "unexpected error: {}",
        err
    );
    assert_eq!(err.exit_code(), 3);

    // The first worktree is untouched and still usable
    assert!(first.path.is_dir());
    fs::write(first.path.join("still-here.txt"), "ok\n").unwrap();
    let status = manager.check_clean(&first.path).unwrap();
    assert_eq!(status.untracked, vec!["still-here.txt"]);
    assert_eq!(
        status.current_branch.as_deref(),
        Some("issue-42-add-retry-logic")
    );
}

#[test]
fn test_worktree_path_conflict() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    let ctx = context(&repo, &plan_dir);
    let manager = WorktreeManager::new(&ctx, &SystemRunner);

    let target = repo.parent().unwrap().join("repo-issue-42-add-retry-logic");
    fs::create_dir(&target).unwrap();

    let err = manager.create(&plan_dir).unwrap_err();
    assert!(matches!(err, ImplflowError::PathConflict { .. }));
    // Nothing was created on the way to the conflict
    assert!(
        git(&repo, &["branch", "--list", "issue-42-add-retry-logic"]).is_empty()
    );
}

#[test]
fn test_create_branch_and_check_branch_in_place() {
    let (_temp, repo) = setup_repo();
    let plan_dir = write_plan(&repo);
    let ctx = context(&repo, &plan_dir);
    let manager = WorktreeManager::new(&ctx, &SystemRunner);

    let err = manager.check_branch(&repo, &plan_dir).unwrap_err();
    assert!(matches!(
        err,
        ImplflowError::BranchMismatch { ref actual, .. } if actual == "main"
    ));

    let switch = manager.create_branch(&repo, &plan_dir).unwrap();
    assert_eq!(switch.previous, "main");
    assert_eq!(switch.branch.name, "issue-42-add-retry-logic");
    assert_eq!(
        manager.check_branch(&repo, &plan_dir).unwrap(),
        "issue-42-add-retry-logic"
    );
}

#[test]
fn test_remove_missing_worktree() {
    let (temp, repo) = setup_repo();
    let ctx = WorkflowContext::new(&repo, &Config::default());
    let missing = temp.path().join("repo-gone");

    let err = WorktreeManager::new(&ctx, &SystemRunner)
        .remove(&missing)
        .unwrap_err();
    assert!(matches!(err, ImplflowError::NotFound { .. }));
    assert_eq!(err.exit_code(), 2);
}
