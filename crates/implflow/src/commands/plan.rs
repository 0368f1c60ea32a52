//! Plan document commands: branch-name, status, task update, context append

use std::path::{Path, PathBuf};

use clap::Subcommand;
use owo_colors::OwoColorize;
use serde::Serialize;

use implflow_core::editor::{
    SectionAppend, TaskUpdate, append_to_context_file, context_timestamp, update_task_file,
};
use implflow_core::{
    ImplflowError, PlanDirectory, PlanKind, PlanReport, TaskStatus, branch_name, init_plan,
};

use super::{Invocation, setup_error};
use crate::colors::PALETTE;
use crate::output::JsonIssue;

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Mark the first task matching a pattern as done or pending
    #[command(long_about = "Mark the first task matching a pattern as done or pending.\n\nThe pattern is a case-insensitive substring of the task text. Only the first\nmatching line is changed, so re-running the command is harmless.\nFails without writing when no task matches.")]
    Update {
        /// Plan directory or tasks file
        target: PathBuf,

        /// Substring of the task text
        #[arg(long)]
        pattern: String,

        /// done or pending
        #[arg(long, default_value = "done")]
        status: TaskStatus,

        /// Report the match without writing
        #[arg(long)]
        dry_run: bool,
    },
}

/// Context subcommands
#[derive(Subcommand, Debug)]
pub enum ContextCommands {
    /// Append a bullet to a section of the context document
    Append {
        /// Plan directory or context file
        target: PathBuf,

        /// Section heading (matched case-insensitively)
        #[arg(long)]
        section: String,

        /// Entry text
        #[arg(long)]
        text: String,

        /// Do not prefix the entry with a timestamp
        #[arg(long)]
        no_timestamp: bool,

        /// Report the insertion without writing
        #[arg(long)]
        dry_run: bool,
    },
}

/// JSON output for branch-name
#[derive(Serialize)]
pub struct BranchNameData {
    pub branch_name: String,
    pub issue_number: Option<u64>,
    pub plan_dir: String,
}

/// JSON output for task update
#[derive(Serialize)]
pub struct TaskUpdateData {
    pub file: String,
    #[serde(flatten)]
    pub update: TaskUpdate,
    pub changed: bool,
    pub dry_run: bool,
}

/// JSON output for context append
#[derive(Serialize)]
pub struct ContextAppendData {
    pub file: String,
    #[serde(flatten)]
    pub append: SectionAppend,
    pub dry_run: bool,
}

/// Run the init command
pub fn run_init(inv: &Invocation, id: String, plan_type: PlanKind, force: bool) -> Result<i32, String> {
    let ctx = inv.context(None, None).map_err(setup_error)?;
    let docs_root = ctx.resolve(Path::new(&ctx.settings.docs_dir));
    let result = init_plan(&docs_root, &id, plan_type, force, &context_timestamp());

    inv.output.finish("init", result, vec![], |scaffold| {
        println!(
            "Initialized {} plan in {}",
            scaffold.plan_type,
            scaffold.plan_dir.display().style(PALETTE.branch)
        );
        for file in &scaffold.files {
            println!("  {}", file.display());
        }
        if let Some(issue) = scaffold.issue_number {
            println!("Linked to issue #{}", issue);
        }
    })
}

/// Run the branch-name command
pub fn run_branch_name(inv: &Invocation, plan_dir: PathBuf) -> Result<i32, String> {
    let plan_dir = inv.absolute(&plan_dir).map_err(setup_error)?;
    let result = PlanDirectory::open(&plan_dir).and_then(|dir| {
        Ok(BranchNameData {
            branch_name: branch_name(&dir.path)?,
            issue_number: dir.issue_number,
            plan_dir: dir.path.display().to_string(),
        })
    });

    inv.output.finish("branch-name", result, vec![], |data| {
        println!("{}", data.branch_name);
    })
}

/// Run the status command
pub fn run_status(inv: &Invocation, plan_dir: PathBuf) -> Result<i32, String> {
    let plan_dir = inv.absolute(&plan_dir).map_err(setup_error)?;
    let result = PlanReport::load(&plan_dir);
    let issues = match &result {
        Ok(report) => report
            .warnings
            .iter()
            .map(|w| JsonIssue::warning("W001", w.as_str()))
            .collect(),
        Err(_) => vec![],
    };

    inv.output.finish("status", result, issues, |report| {
        let title = report.title.as_deref().unwrap_or("(untitled plan)");
        println!("{}", title.style(PALETTE.branch));
        println!(
            "Progress: {}/{} tasks ({}%)",
            report.progress.completed, report.progress.total, report.progress.completion_percentage
        );
        for phase in &report.phases {
            let line = format!(
                "  Phase {}: {} [{}/{}]",
                phase.number, phase.name, phase.progress.completed, phase.progress.total
            );
            println!("{}", line.style(PALETTE.for_progress(&phase.progress)));
        }
        let criteria = &report.success_criteria;
        if !criteria.is_empty() {
            println!(
                "Success criteria: {} automated, {} manual",
                criteria.automated.len(),
                criteria.manual.len()
            );
        }
    })
}

/// Run a task subcommand
pub fn run_task(inv: &Invocation, command: TaskCommands) -> Result<i32, String> {
    let TaskCommands::Update {
        target,
        pattern,
        status,
        dry_run,
    } = command;
    let target = inv.absolute(&target).map_err(setup_error)?;

    let result = resolve_document(&target, |dir| dir.tasks_file().map(Path::to_path_buf))
        .and_then(|file| {
            let update = update_task_file(&file, &pattern, status, dry_run)?;
            Ok(TaskUpdateData {
                file: file.display().to_string(),
                changed: update.changed(),
                update,
                dry_run,
            })
        });

    inv.output.finish("task-update", result, vec![], |data| {
        let verb = if data.dry_run { "Would mark" } else { "Marked" };
        println!(
            "{} line {} as {}: {}",
            verb, data.update.line, data.update.status, data.update.description
        );
    })
}

/// Run a context subcommand
pub fn run_context(inv: &Invocation, command: ContextCommands) -> Result<i32, String> {
    let ContextCommands::Append {
        target,
        section,
        text,
        no_timestamp,
        dry_run,
    } = command;
    let ctx = inv.context(None, None).map_err(setup_error)?;
    let target = inv.absolute(&target).map_err(setup_error)?;

    let timestamp = (ctx.settings.timestamp_context && !no_timestamp).then(context_timestamp);
    let result = resolve_document(&target, |dir| dir.context_file().map(Path::to_path_buf))
        .and_then(|file| {
            let append =
                append_to_context_file(&file, &section, &text, timestamp.as_deref(), dry_run)?;
            Ok(ContextAppendData {
                file: file.display().to_string(),
                append,
                dry_run,
            })
        });

    inv.output.finish("context-append", result, vec![], |data| {
        let created = if data.append.created_section { " (new section)" } else { "" };
        println!("{} -> {}{}", data.append.entry, data.append.section, created);
    })
}

/// A file path is used as-is; a directory is opened as a plan directory
fn resolve_document(
    target: &Path,
    pick: impl FnOnce(&PlanDirectory) -> Result<PathBuf, ImplflowError>,
) -> Result<PathBuf, ImplflowError> {
    if target.is_file() {
        return Ok(target.to_path_buf());
    }
    let dir = PlanDirectory::open(target)?;
    pick(&dir)
}
