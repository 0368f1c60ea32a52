//! In-place edits of plan documents
//!
//! Edits operate on raw text and only touch the targeted line (task status)
//! or insert new lines (section append). Every other byte is preserved.

use std::path::Path;

use serde::Serialize;

use crate::error::ImplflowError;
use crate::parser::{LineKind, classify};
use crate::types::TaskStatus;

mod patterns {
    use std::sync::LazyLock;

    /// `(- [)(marker)(] )(description)`
    pub static TASK_LINE: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^(-\s+\[)([ xX])(\]\s+)(.+)$").unwrap());
}

/// Record of a task status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    /// Line number of the updated task (1-indexed)
    pub line: usize,
    /// Task text after the checkbox
    pub description: String,
    pub previous: TaskStatus,
    pub status: TaskStatus,
}

impl TaskUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.status
    }
}

/// Set the status of the first task whose text contains `pattern`.
///
/// Matching is a case-insensitive substring test. Only the first matching
/// line (top to bottom) is rewritten; other matches are left alone so a
/// repeated call is idempotent.
pub fn update_task_status(
    content: &str,
    pattern: &str,
    status: TaskStatus,
) -> Result<(String, TaskUpdate), ImplflowError> {
    let needle = pattern.to_lowercase();
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    for (idx, line) in lines.iter_mut().enumerate() {
        let Some(caps) = patterns::TASK_LINE.captures(line) else {
            continue;
        };
        let description = caps.get(4).unwrap().as_str();
        if !description.to_lowercase().contains(&needle) {
            continue;
        }

        let previous = TaskStatus::from_marker(
            caps.get(2).unwrap().as_str().chars().next().unwrap_or(' '),
        );
        let update = TaskUpdate {
            line: idx + 1,
            description: description.trim_end_matches('\r').trim().to_string(),
            previous,
            status,
        };
        let rewritten = format!(
            "{}{}{}{}",
            caps.get(1).unwrap().as_str(),
            status.marker(),
            caps.get(3).unwrap().as_str(),
            description
        );
        *line = rewritten;
        return Ok((lines.join("\n"), update));
    }

    Err(ImplflowError::TaskNotFound {
        pattern: pattern.to_string(),
    })
}

/// Read a tasks file, update one task, and write it back.
///
/// Nothing is written when no task matches or when `dry_run` is set.
pub fn update_task_file(
    path: &Path,
    pattern: &str,
    status: TaskStatus,
    dry_run: bool,
) -> Result<TaskUpdate, ImplflowError> {
    if !path.is_file() {
        return Err(ImplflowError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let (updated, update) = update_task_status(&content, pattern, status)?;

    if dry_run {
        tracing::info!(line = update.line, "dry run, tasks file not written");
    } else if updated != content {
        std::fs::write(path, updated).map_err(|e| ImplflowError::from_write(e, path))?;
        tracing::debug!(path = %path.display(), line = update.line, %status, "task updated");
    }

    Ok(update)
}

/// Where a section append landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionAppend {
    pub section: String,
    /// The bullet line that was inserted
    pub entry: String,
    /// Line number of the inserted bullet (1-indexed)
    pub line: usize,
    /// Whether a new `##` section had to be created
    pub created_section: bool,
}

/// Append a bullet to a named section.
///
/// The section is the first `###`-or-deeper heading whose title equals
/// `section` case-insensitively. The bullet goes after the section's last
/// non-blank line, before the next heading of the same or higher level. When
/// no such heading exists a new `## section` is appended at the end.
pub fn append_to_section(
    content: &str,
    section: &str,
    text: &str,
    timestamp: Option<&str>,
) -> (String, SectionAppend) {
    let entry = match timestamp {
        Some(ts) => format!("- [{}] {}", ts, text),
        None => format!("- {}", text),
    };

    let mut lines: Vec<&str> = content.split('\n').collect();
    let wanted = section.trim().to_lowercase();

    let found = lines.iter().enumerate().find_map(|(idx, line)| match classify(line) {
        LineKind::Heading { level, text } | LineKind::PhaseHeader { level, name: text, .. }
            if level >= 3 && heading_title(line, text).to_lowercase() == wanted =>
        {
            Some((idx, level))
        }
        _ => None,
    });

    if let Some((start, level)) = found {
        let end = lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, line)| classify(line).heading_level().is_some_and(|l| l <= level))
            .map(|(idx, _)| idx)
            .unwrap_or(lines.len());

        let mut insert_at = end;
        while insert_at > start + 1 && lines[insert_at - 1].trim().is_empty() {
            insert_at -= 1;
        }

        lines.insert(insert_at, &entry);
        let updated = lines.join("\n");
        return (
            updated,
            SectionAppend {
                section: section.to_string(),
                entry: entry.clone(),
                line: insert_at + 1,
                created_section: false,
            },
        );
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with("\n\n") {
        updated.push_str(if updated.ends_with('\n') { "\n" } else { "\n\n" });
    }
    let heading_line = updated.matches('\n').count() + 1;
    updated.push_str(&format!("## {}\n\n{}\n", section.trim(), entry));

    (
        updated,
        SectionAppend {
            section: section.to_string(),
            entry,
            line: heading_line + 2,
            created_section: true,
        },
    )
}

/// Full heading text regardless of whether it parsed as a phase header
fn heading_title<'a>(line: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = line.trim_end_matches('\r').trim_start_matches('#').trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

/// Local time as `YYYY-MM-DD HH:MM`, the prefix used for context entries
pub fn context_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Read a context file, append an entry to a section, and write it back
pub fn append_to_context_file(
    path: &Path,
    section: &str,
    text: &str,
    timestamp: Option<&str>,
    dry_run: bool,
) -> Result<SectionAppend, ImplflowError> {
    if !path.is_file() {
        return Err(ImplflowError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let (updated, appended) = append_to_section(&content, section, text, timestamp);

    if !dry_run {
        std::fs::write(path, updated).map_err(|e| ImplflowError::from_write(e, path))?;
        tracing::debug!(path = %path.display(), section, "context entry appended");
    }

    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKS: &str = "## Phase 1: Foundation\n\n- [ ] Add tests for parser - src/parser.rs\n- [ ] Add tests for editor\n- [x] Write docs\n";

    #[test]
    fn test_update_first_match_only() {
        let (updated, update) = update_task_status(TASKS, "add TESTS", TaskStatus::Done).unwrap();

        assert_eq!(update.line, 3);
        assert_eq!(update.description, "Add tests for parser - src/parser.rs");
        assert_eq!(update.previous, TaskStatus::Pending);
        assert!(updated.contains("- [x] Add tests for parser - src/parser.rs\n"));
        assert!(updated.contains("- [ ] Add tests for editor\n"));
    }

    #[test]
    fn test_update_is_idempotent() {
        let (once, _) = update_task_status(TASKS, "Add tests", TaskStatus::Done).unwrap();
        let (twice, update) = update_task_status(&once, "Add tests", TaskStatus::Done).unwrap();
        assert_eq!(once, twice);
        assert!(!update.changed());
    }

    #[test]
    fn test_update_back_to_pending() {
        let (updated, update) = update_task_status(TASKS, "write docs", TaskStatus::Pending).unwrap();
        assert!(updated.contains("- [ ] Write docs\n"));
        assert!(update.changed());
        // Trailing newline and untouched lines survive
        assert!(updated.ends_with('\n'));
        assert_eq!(updated.len(), TASKS.len());
    }

    #[test]
    fn test_update_no_match_fails() {
        let err = update_task_status(TASKS, "deploy", TaskStatus::Done).unwrap_err();
        assert!(matches!(err, ImplflowError::TaskNotFound { .. }));
    }

    #[test]
    fn test_update_task_file_not_written_on_miss() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("1-tasks.md");
        std::fs::write(&path, TASKS).unwrap();

        assert!(update_task_file(&path, "nothing here", TaskStatus::Done, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TASKS);

        update_task_file(&path, "Add tests", TaskStatus::Done, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TASKS);

        update_task_file(&path, "Add tests", TaskStatus::Done, false).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("- [x] Add tests for parser"));
    }

    const CONTEXT: &str = "# Context\n\n## Notes\n\n### Key Findings\n- Existing finding\n\n#### Detail\n- nested\n\n### Decisions\n- Use backoff\n";

    #[test]
    fn test_append_existing_section() {
        let (updated, appended) = append_to_section(CONTEXT, "key findings", "Pool is shared", None);

        assert!(!appended.created_section);
        assert_eq!(
            updated,
            "# Context\n\n## Notes\n\n### Key Findings\n- Existing finding\n\n#### Detail\n- nested\n- Pool is shared\n\n### Decisions\n- Use backoff\n"
        );
        assert_eq!(appended.line, 10);
    }

    #[test]
    fn test_append_last_section_at_eof() {
        let (updated, _) =
            append_to_section(CONTEXT, "Decisions", "Cap retries at 5", Some("2026-10-19 09:30"));
        assert!(updated.ends_with("- Use backoff\n- [2026-10-19 09:30] Cap retries at 5\n"));
    }

    #[test]
    fn test_append_creates_missing_section() {
        let (updated, appended) = append_to_section(CONTEXT, "Open Risks", "Flaky CI", None);

        assert!(appended.created_section);
        assert!(updated.starts_with(CONTEXT));
        assert!(updated.ends_with("- Use backoff\n\n## Open Risks\n\n- Flaky CI\n"));
        let lines: Vec<&str> = updated.split('\n').collect();
        assert_eq!(lines[appended.line - 1], "- Flaky CI");
    }

    #[test]
    fn test_append_only_inserts() {
        let (updated, _) = append_to_section(CONTEXT, "Key Findings", "x", None);
        let original: Vec<&str> = CONTEXT.split('\n').collect();
        let mut remaining: Vec<&str> = updated.split('\n').collect();
        remaining.retain(|l| *l != "- x");
        assert_eq!(original, remaining);
    }

    #[test]
    fn test_context_timestamp_shape() {
        let ts = context_timestamp();
        assert_eq!(ts.len(), 16);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }

    #[test]
    fn test_level_two_heading_not_matched_as_section() {
        let (updated, appended) = append_to_section(CONTEXT, "Notes", "loose note", None);
        assert!(appended.created_section);
        assert!(updated.ends_with("## Notes\n\n- loose note\n"));
    }
}
