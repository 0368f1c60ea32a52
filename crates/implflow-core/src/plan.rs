//! Plan directory model
//!
//! A plan directory holds up to four documents (`*-plan.md`, `*-tasks.md`,
//! `*-context.md`, `*-research.md`). [`PlanDocument`] is the parsed view of
//! the tasks document; [`PlanReport`] combines it with the plan document for
//! progress reporting.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::branch::extract_issue_number;
use crate::error::ImplflowError;
use crate::parser::{extract_title, parse_phases, parse_success_criteria, parse_tasks};
use crate::types::{Phase, Progress, SuccessCriteria, Task};

/// Locations of the documents in a plan directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<PathBuf>,
}

impl PlanFiles {
    /// Files directly inside `dir` whose name ends with `suffix`, sorted by name
    pub fn matching(dir: &Path, suffix: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(suffix))
            })
            .collect();
        files.sort();
        files
    }

    /// Locate the four documents in a plan directory
    pub fn discover(dir: &Path) -> Self {
        let first = |suffix: &str| Self::matching(dir, suffix).into_iter().next();
        Self {
            plan: first("-plan.md"),
            tasks: first("-tasks.md"),
            context: first("-context.md"),
            research: first("-research.md"),
        }
    }
}

/// A plan directory and the documents found in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDirectory {
    pub path: PathBuf,
    pub issue_number: Option<u64>,
    pub files: PlanFiles,
}

impl PlanDirectory {
    /// Open a plan directory, failing if it does not exist
    pub fn open(path: &Path) -> Result<Self, ImplflowError> {
        if !path.is_dir() {
            return Err(ImplflowError::PlanNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            issue_number: extract_issue_number(path),
            files: PlanFiles::discover(path),
        })
    }

    /// Path of the plan document, or NotFound
    pub fn plan_file(&self) -> Result<&Path, ImplflowError> {
        self.require(self.files.plan.as_deref(), "plan")
    }

    /// Path of the tasks document, or NotFound
    pub fn tasks_file(&self) -> Result<&Path, ImplflowError> {
        self.require(self.files.tasks.as_deref(), "tasks")
    }

    /// Path of the context document, or NotFound
    pub fn context_file(&self) -> Result<&Path, ImplflowError> {
        self.require(self.files.context.as_deref(), "context")
    }

    fn require<'a>(&self, file: Option<&'a Path>, kind: &str) -> Result<&'a Path, ImplflowError> {
        file.ok_or_else(|| ImplflowError::PlanFileNotFound {
            kind: kind.to_string(),
            dir: self.path.clone(),
        })
    }

    /// Parse the tasks document
    pub fn load_tasks(&self) -> Result<PlanDocument, ImplflowError> {
        let content = std::fs::read_to_string(self.tasks_file()?)?;
        Ok(PlanDocument::parse(&content))
    }
}

/// Parsed view of a tasks document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanDocument {
    pub phases: Vec<Phase>,
    pub tasks: Vec<Task>,
}

impl PlanDocument {
    pub fn parse(content: &str) -> Self {
        let parsed = parse_tasks(content);
        Self {
            phases: parsed.phases,
            tasks: parsed.tasks,
        }
    }

    /// Overall task progress
    pub fn progress(&self) -> Progress {
        let completed = self.tasks.iter().filter(|t| t.is_done()).count();
        Progress::from_counts(completed, self.tasks.len())
    }

    /// Tasks whose phase back-reference equals `number`
    pub fn tasks_in_phase(&self, number: u32) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.phase == Some(number))
    }

    /// Progress restricted to one phase
    pub fn phase_progress(&self, number: u32) -> Progress {
        let (completed, total) = self
            .tasks_in_phase(number)
            .fold((0, 0), |(done, total), t| (done + usize::from(t.is_done()), total + 1));
        Progress::from_counts(completed, total)
    }

    /// Warnings for duplicate or descending phase numbers.
    ///
    /// Phases are not rejected at parse time; callers decide what to do.
    pub fn phase_order_warnings(&self) -> Vec<String> {
        phase_order_warnings(&self.phases)
    }
}

/// Duplicate / out-of-order checks over a phase list
pub fn phase_order_warnings(phases: &[Phase]) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut previous: Option<&Phase> = None;

    for phase in phases {
        if !seen.insert(phase.number) {
            warnings.push(format!(
                "duplicate phase number {} at line {}",
                phase.number, phase.line
            ));
        } else if let Some(prev) = previous {
            if phase.number < prev.number {
                warnings.push(format!(
                    "phase {} at line {} follows phase {}",
                    phase.number, phase.line, prev.number
                ));
            }
        }
        previous = Some(phase);
    }

    warnings
}

/// One phase with its tasks and counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub number: u32,
    pub name: String,
    #[serde(flatten)]
    pub progress: Progress,
    pub tasks: Vec<Task>,
}

/// Full report over a plan directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub plan_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub issue_number: Option<u64>,
    pub files: PlanFiles,
    pub phases: Vec<PhaseReport>,
    pub all_tasks: Vec<Task>,
    pub success_criteria: SuccessCriteria,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PlanReport {
    /// Build a report; both the plan and tasks documents are required.
    ///
    /// The phase list comes from the plan document, falling back to the
    /// phase headers of the tasks document when the plan has none.
    pub fn load(plan_dir: &Path) -> Result<Self, ImplflowError> {
        let dir = PlanDirectory::open(plan_dir)?;
        let plan_content = std::fs::read_to_string(dir.plan_file()?)?;
        let document = dir.load_tasks()?;

        let mut phases = parse_phases(&plan_content);
        if phases.is_empty() {
            phases = document.phases.clone();
        }

        let mut warnings = phase_order_warnings(&phases);
        warnings.extend(
            document
                .phase_order_warnings()
                .into_iter()
                .map(|w| format!("tasks: {}", w)),
        );

        let phase_reports = phases
            .iter()
            .map(|phase| PhaseReport {
                number: phase.number,
                name: phase.name.clone(),
                progress: document.phase_progress(phase.number),
                tasks: document.tasks_in_phase(phase.number).cloned().collect(),
            })
            .collect();

        Ok(Self {
            plan_directory: dir.path.clone(),
            title: extract_title(&plan_content),
            issue_number: dir.issue_number,
            files: dir.files.clone(),
            phases: phase_reports,
            progress: document.progress(),
            all_tasks: document.tasks,
            success_criteria: parse_success_criteria(&plan_content),
            warnings,
        })
    }
}
