//! Core data types for implflow

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Completion state of a task checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    /// Checkbox marker written between the brackets
    pub fn marker(self) -> char {
        match self {
            TaskStatus::Pending => ' ',
            TaskStatus::Done => 'x',
        }
    }

    /// Parse a marker character (`x`/`X` is done, anything else pending)
    pub fn from_marker(marker: char) -> Self {
        if marker.eq_ignore_ascii_case(&'x') {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "done" => Ok(TaskStatus::Done),
            "pending" => Ok(TaskStatus::Pending),
            other => Err(format!("invalid task status: {} (must be done/pending)", other)),
        }
    }
}

/// A numbered phase header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase number as written in the header
    pub number: u32,
    /// Header text after `Phase N:`
    pub name: String,
    /// Line number of the header (1-indexed)
    pub line: usize,
}

/// A checklist task line from the tasks document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Task {
    pub description: String,
    pub file: String,
    pub effort: String,
    pub dependencies: String,
    pub status: TaskStatus,
    /// Number of the most recent phase header above this task
    pub phase: Option<u32>,
    /// Line number of the task (1-indexed)
    pub line: usize,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Verification items collected from the plan document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SuccessCriteria {
    pub automated: Vec<String>,
    pub manual: Vec<String>,
}

impl SuccessCriteria {
    pub fn is_empty(&self) -> bool {
        self.automated.is_empty() && self.manual.is_empty()
    }
}

/// Task completion counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    /// Percentage rounded to one decimal place; 0 when there are no tasks
    pub completion_percentage: f64,
}

impl Progress {
    /// Build progress from counts
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let completion_percentage = if total == 0 {
            0.0
        } else {
            ((completed as f64 / total as f64) * 1000.0).round() / 10.0
        };
        Self {
            total,
            completed,
            completion_percentage,
        }
    }
}

/// A git branch bound to a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub base: String,
}

/// An isolated working directory checked out on a plan branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: Branch,
    /// Main repository root the worktree was created from
    pub repo_root: PathBuf,
}

/// Classification of a working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CleanStatus {
    pub clean: bool,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
    pub untracked: Vec<String>,
    pub current_branch: Option<String>,
    /// Whether the current branch follows the `issue-*` / `feature-*` convention
    pub is_implementation_branch: bool,
}

/// A created commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    /// `git show --stat --oneline` output
    pub stats: String,
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Commit),
    /// Nothing was staged, so no commit was created
    NoOp,
}

impl CommitOutcome {
    pub fn commit(&self) -> Option<&Commit> {
        match self {
            CommitOutcome::Committed(c) => Some(c),
            CommitOutcome::NoOp => None,
        }
    }
}

/// An opened pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub url: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
}
