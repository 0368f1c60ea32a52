//! New plan directories
//!
//! Issue plans live under `<docs>/issues/<n>/`, ad-hoc plans under
//! `<docs>/adhoc/<name>/`. Each gets the four documents the rest of the
//! workflow reads, pre-filled so they parse: a `#` title, numbered phase
//! headers, task checkboxes and `###` context sections.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ImplflowError;

/// Whether a plan tracks a hosted issue or stands alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    #[default]
    Issue,
    Adhoc,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Issue => "issue",
            PlanKind::Adhoc => "adhoc",
        }
    }

    fn parent_dir(self) -> &'static str {
        match self {
            PlanKind::Issue => "issues",
            PlanKind::Adhoc => "adhoc",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = ImplflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "issue" => Ok(PlanKind::Issue),
            "adhoc" => Ok(PlanKind::Adhoc),
            _ => Err(ImplflowError::Parse {
                message: format!("unknown plan type '{}' (expected issue or adhoc)", s),
            }),
        }
    }
}

/// Documents written for a new plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanScaffold {
    pub plan_dir: PathBuf,
    pub plan_type: PlanKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    pub files: Vec<PathBuf>,
    /// Existing documents were replaced (`force`)
    pub overwritten: bool,
}

/// Create a plan directory under `docs_root` with skeleton documents.
///
/// Issue ids must be numeric; ad-hoc names must be a single path component.
/// Existing documents are only replaced with `force`; otherwise the first
/// one found is reported as `PathConflict` and nothing is written.
/// `created` is stamped into the documents as-is.
pub fn init_plan(
    docs_root: &Path,
    id: &str,
    kind: PlanKind,
    force: bool,
    created: &str,
) -> Result<PlanScaffold, ImplflowError> {
    let id = id.trim();
    let (title, issue_number) = match kind {
        PlanKind::Issue => {
            let number: u64 = id.parse().map_err(|_| ImplflowError::Parse {
                message: format!("issue plans need a numeric id, got '{}'", id),
            })?;
            (format!("Issue #{}", number), Some(number))
        }
        PlanKind::Adhoc => {
            if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
                return Err(ImplflowError::Parse {
                    message: format!("invalid plan name '{}'", id),
                });
            }
            (display_name(id), None)
        }
    };

    let plan_dir = docs_root.join(kind.parent_dir()).join(id);
    let ticket = match issue_number {
        Some(n) => format!("Issue #{}", n),
        None => "N/A".to_string(),
    };
    let documents = [
        ("plan", plan_document(&title, &ticket, created)),
        ("tasks", tasks_document(&title)),
        ("context", context_document(&title, created)),
        ("research", research_document(&title, &ticket, created)),
    ];

    let targets: Vec<PathBuf> = documents
        .iter()
        .map(|(kind, _)| plan_dir.join(format!("{}-{}.md", id, kind)))
        .collect();
    let existing = targets.iter().find(|path| path.exists());
    if let (Some(path), false) = (existing, force) {
        return Err(ImplflowError::PathConflict { path: path.clone() });
    }
    let overwritten = existing.is_some();

    std::fs::create_dir_all(&plan_dir).map_err(|e| ImplflowError::from_write(e, &plan_dir))?;
    for (path, (_, content)) in targets.iter().zip(&documents) {
        std::fs::write(path, content).map_err(|e| ImplflowError::from_write(e, path))?;
    }
    tracing::info!(plan_dir = %plan_dir.display(), %kind, overwritten, "plan initialized");

    Ok(PlanScaffold {
        plan_dir,
        plan_type: kind,
        title,
        issue_number,
        files: targets,
        overwritten,
    })
}

/// `retry-cleanup` -> `Retry Cleanup`
fn display_name(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn plan_document(title: &str, ticket: &str, created: &str) -> String {
    format!(
        "# {title}

Created: {created}
Ticket: {ticket}

## Overview
[Brief description of what we're implementing and why]

## Current State
[What exists now, what's missing, key constraints discovered]

## Desired End State
[The end state after this plan is complete, and how to verify it]

## Out of Scope
[Items deliberately left out]

## Approach
[High-level strategy and reasoning]

## Phase 1: Foundation
[What this phase accomplishes]

### Changes
[Files or components touched and how]

## Phase 2: Next Phase
[What this phase accomplishes]

## Success Criteria

### Automated Verification
- [ ] Test suite passes

### Manual Verification
- [ ] Behavior confirmed by hand
"
    )
}

fn tasks_document(title: &str) -> String {
    format!(
        "# Tasks: {title}

## Phase 1: Foundation
- [ ] Describe the first task - path/to/file - 1h - none

## Phase 2: Next Phase
- [ ] Describe the next task - path/to/file - 1h - Phase 1
"
    )
}

fn context_document(title: &str, created: &str) -> String {
    format!(
        "# Context: {title}

Created: {created}

## Quick Summary
[1-2 sentence summary of what this task does]

## Notes

### Key Findings

### Decisions

### Open Questions
"
    )
}

fn research_document(title: &str, ticket: &str, created: &str) -> String {
    format!(
        "# Research: {title}

Date: {created}
Ticket: {ticket}

## Initial Understanding
[What we thought the task was about initially]

## Findings

## References
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::branch_name;
    use crate::commit::phase_commit_message;
    use crate::plan::PlanReport;
    use std::fs;

    const CREATED: &str = "2026-10-19 09:30";

    #[test]
    fn test_issue_plan_parses() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join(".docs");

        let scaffold = init_plan(&docs, "42", PlanKind::Issue, false, CREATED).unwrap();
        assert_eq!(scaffold.plan_dir, docs.join("issues").join("42"));
        assert_eq!(scaffold.issue_number, Some(42));
        assert_eq!(scaffold.files.len(), 4);
        assert!(!scaffold.overwritten);

        assert_eq!(branch_name(&scaffold.plan_dir).unwrap(), "issue-42-issue-42");

        let report = PlanReport::load(&scaffold.plan_dir).unwrap();
        assert_eq!(report.title.as_deref(), Some("Issue #42"));
        assert_eq!(report.phases.len(), 2);
        assert_eq!(report.phases[0].name, "Foundation");
        assert_eq!(report.progress.total, 2);
        assert_eq!(report.progress.completed, 0);
        assert!(report.warnings.is_empty());
        assert_eq!(report.success_criteria.automated.len(), 1);
        assert_eq!(report.success_criteria.manual.len(), 1);

        let plan = fs::read_to_string(scaffold.plan_dir.join("42-plan.md")).unwrap();
        assert!(plan.contains("Created: 2026-10-19 09:30"));
        let message = phase_commit_message(&plan, 1, "42-plan.md", Some(42));
        assert!(message.starts_with("Phase 1: Foundation\n\n[What this phase accomplishes]"));
    }

    #[test]
    fn test_adhoc_plan() {
        let temp = tempfile::tempdir().unwrap();
        let scaffold =
            init_plan(temp.path(), "retry-cleanup", PlanKind::Adhoc, false, CREATED).unwrap();

        assert_eq!(scaffold.plan_dir, temp.path().join("adhoc").join("retry-cleanup"));
        assert_eq!(scaffold.title, "Retry Cleanup");
        assert_eq!(scaffold.issue_number, None);
        assert!(scaffold.plan_dir.join("retry-cleanup-context.md").is_file());
        assert_eq!(branch_name(&scaffold.plan_dir).unwrap(), "feature-retry-cleanup");
    }

    #[test]
    fn test_existing_documents_need_force() {
        let temp = tempfile::tempdir().unwrap();
        let first = init_plan(temp.path(), "7", PlanKind::Issue, false, CREATED).unwrap();
        let tasks = first.plan_dir.join("7-tasks.md");
        fs::write(&tasks, "- [x] edited\n").unwrap();

        let err = init_plan(temp.path(), "7", PlanKind::Issue, false, CREATED).unwrap_err();
        assert!(matches!(err, ImplflowError::PathConflict { .. }));
        assert_eq!(fs::read_to_string(&tasks).unwrap(), "- [x] edited\n");

        let again = init_plan(temp.path(), "7", PlanKind::Issue, true, CREATED).unwrap();
        assert!(again.overwritten);
        assert!(fs::read_to_string(&tasks).unwrap().contains("## Phase 1: Foundation"));
    }

    #[test]
    fn test_invalid_ids() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            init_plan(temp.path(), "abc", PlanKind::Issue, false, CREATED),
            Err(ImplflowError::Parse { .. })
        ));
        assert!(init_plan(temp.path(), "../escape", PlanKind::Adhoc, false, CREATED).is_err());
        assert!(init_plan(temp.path(), "", PlanKind::Adhoc, false, CREATED).is_err());
        assert!(!temp.path().join("issues").exists());
    }

    #[test]
    fn test_plan_kind_from_str() {
        assert_eq!("ADHOC".parse::<PlanKind>().unwrap(), PlanKind::Adhoc);
        assert!("epic".parse::<PlanKind>().is_err());
    }
}
