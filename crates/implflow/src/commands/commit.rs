//! Commit commands: commit-phase, commit-plan

use std::path::PathBuf;

use owo_colors::OwoColorize;
use serde::Serialize;

use implflow_core::{CommitOutcome, ImplflowError, PhaseCommitBuilder, SystemRunner};

use super::{Invocation, setup_error};
use crate::colors::PALETTE;

/// JSON output for commit commands
#[derive(Serialize)]
pub struct CommitData {
    /// False when there was nothing to commit
    pub committed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
}

impl From<CommitOutcome> for CommitData {
    fn from(outcome: CommitOutcome) -> Self {
        match outcome {
            CommitOutcome::Committed(commit) => Self {
                committed: true,
                commit_hash: Some(commit.hash),
                message: Some(commit.message),
                stats: Some(commit.stats),
            },
            CommitOutcome::NoOp => Self {
                committed: false,
                commit_hash: None,
                message: None,
                stats: None,
            },
        }
    }
}

/// Run the commit-phase command
pub fn run_commit_phase(
    inv: &Invocation,
    plan_dir: PathBuf,
    phase: u32,
    dir: Option<PathBuf>,
) -> Result<i32, String> {
    let ctx = inv.context(Some(&plan_dir), None).map_err(setup_error)?;
    let dir = inv.work_dir(&ctx, dir.as_deref()).map_err(setup_error)?;
    let builder = PhaseCommitBuilder::new(&ctx, &SystemRunner);
    let result = ctx
        .plan_dir()
        .and_then(|plan| builder.commit_phase(&dir, plan, phase));

    finish(inv, "commit-phase", result)
}

/// Run the commit-plan command
pub fn run_commit_plan(inv: &Invocation, plan_dir: PathBuf, dir: Option<PathBuf>) -> Result<i32, String> {
    let ctx = inv.context(Some(&plan_dir), None).map_err(setup_error)?;
    let dir = inv.work_dir(&ctx, dir.as_deref()).map_err(setup_error)?;
    let builder = PhaseCommitBuilder::new(&ctx, &SystemRunner);
    let result = ctx
        .plan_dir()
        .and_then(|plan| builder.commit_plan_files(&dir, plan));

    finish(inv, "commit-plan", result)
}

fn finish(
    inv: &Invocation,
    command: &str,
    result: Result<CommitOutcome, ImplflowError>,
) -> Result<i32, String> {
    inv.output
        .finish(command, result.map(CommitData::from), vec![], |data| {
            match (&data.commit_hash, &data.message) {
                (Some(hash), Some(message)) => {
                    let subject = message.lines().next().unwrap_or_default();
                    println!("{} {}", hash.style(PALETTE.done), subject);
                }
                _ => println!("Nothing to commit"),
            }
        })
}
