//! Plan document parsing
//!
//! Plan documents are semi-structured markdown. Parsing is line-oriented:
//! every line is first classified into a [`LineKind`], and the document
//! readers below consume those tagged lines to build phases, tasks and
//! success criteria. The regex patterns stay private to this module.

use crate::types::{Phase, SuccessCriteria, Task, TaskStatus};

/// Regex patterns for parsing (compiled once)
mod patterns {
    use std::sync::LazyLock;

    pub static HEADING: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^(#{1,6})\s+(.*?)\s*$").unwrap());

    pub static PHASE_TITLE: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^Phase\s+(\d+):\s*(.+)$").unwrap());

    pub static TASK: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^-\s+\[([ xX])\]\s+(.+?)\s*$").unwrap());

    pub static BULLET: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^\s*[-*]\s+(.*?)\s*$").unwrap());

    pub static CHECKBOX_PREFIX: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^\[[ xX]\]\s*").unwrap());
}

/// Classification of a single markdown line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `## Phase N: name` (two or more `#`)
    PhaseHeader {
        level: usize,
        number: u32,
        name: &'a str,
    },
    /// Any other heading
    Heading { level: usize, text: &'a str },
    /// `- [ ] body` / `- [x] body`
    Task { status: TaskStatus, body: &'a str },
    /// `- item` / `* item`
    Bullet { text: &'a str },
    Blank,
    Text(&'a str),
}

impl LineKind<'_> {
    pub fn is_heading(&self) -> bool {
        matches!(self, LineKind::PhaseHeader { .. } | LineKind::Heading { .. })
    }

    /// Heading level, if this line is a heading
    pub fn heading_level(&self) -> Option<usize> {
        match self {
            LineKind::PhaseHeader { level, .. } | LineKind::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}

/// Classify one line
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim_end_matches('\r');

    if let Some(caps) = patterns::HEADING.captures(line) {
        let level = caps.get(1).unwrap().as_str().len();
        let text = caps.get(2).unwrap().as_str();
        if level >= 2 {
            if let Some(phase) = patterns::PHASE_TITLE.captures(text) {
                if let Ok(number) = phase.get(1).unwrap().as_str().parse::<u32>() {
                    return LineKind::PhaseHeader {
                        level,
                        number,
                        name: phase.get(2).unwrap().as_str().trim(),
                    };
                }
            }
        }
        return LineKind::Heading { level, text };
    }

    if let Some(caps) = patterns::TASK.captures(line) {
        let marker = caps.get(1).unwrap().as_str().chars().next().unwrap_or(' ');
        return LineKind::Task {
            status: TaskStatus::from_marker(marker),
            body: caps.get(2).unwrap().as_str(),
        };
    }

    if let Some(caps) = patterns::BULLET.captures(line) {
        return LineKind::Bullet {
            text: caps.get(1).unwrap().as_str(),
        };
    }

    if line.trim().is_empty() {
        LineKind::Blank
    } else {
        LineKind::Text(line)
    }
}

/// Split a task body into its positional fields.
///
/// `desc - file - effort - deps`; absent trailing fields are empty.
pub fn split_task_fields(body: &str) -> [String; 4] {
    let mut parts = body.split(" - ").map(|p| p.trim().to_string());
    let description = parts.next().unwrap_or_default();
    let file = parts.next().unwrap_or_default();
    let effort = parts.next().unwrap_or_default();
    let dependencies = parts.next().unwrap_or_default();
    [description, file, effort, dependencies]
}

/// Parsed contents of a tasks document
#[derive(Debug, Clone, Default)]
pub struct ParsedTasks {
    pub phases: Vec<Phase>,
    pub tasks: Vec<Task>,
}

/// Parse a tasks document into phases and tasks.
///
/// A task belongs to the phase header that most recently preceded it.
pub fn parse_tasks(content: &str) -> ParsedTasks {
    let mut parsed = ParsedTasks::default();
    let mut current_phase: Option<u32> = None;

    for (idx, line) in content.lines().enumerate() {
        match classify(line) {
            LineKind::PhaseHeader { number, name, .. } => {
                current_phase = Some(number);
                parsed.phases.push(Phase {
                    number,
                    name: name.to_string(),
                    line: idx + 1,
                });
            }
            LineKind::Task { status, body } => {
                let [description, file, effort, dependencies] = split_task_fields(body);
                parsed.tasks.push(Task {
                    description,
                    file,
                    effort,
                    dependencies,
                    status,
                    phase: current_phase,
                    line: idx + 1,
                });
            }
            _ => {}
        }
    }

    parsed
}

/// Collect every phase header in a document
pub fn parse_phases(content: &str) -> Vec<Phase> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match classify(line) {
            LineKind::PhaseHeader { number, name, .. } => Some(Phase {
                number,
                name: name.to_string(),
                line: idx + 1,
            }),
            _ => None,
        })
        .collect()
}

/// Text of the first level-1 heading, trimmed
pub fn extract_title(content: &str) -> Option<String> {
    content.lines().find_map(|line| match classify(line) {
        LineKind::Heading { level: 1, text } if !text.is_empty() => Some(text.to_string()),
        _ => None,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CriteriaSection {
    None,
    Automated,
    Manual,
}

fn criteria_marker(line: &str) -> Option<CriteriaSection> {
    let lower = line.to_lowercase();
    if lower.contains("automated verification") || lower.contains("automated testing") {
        Some(CriteriaSection::Automated)
    } else if lower.contains("manual verification") || lower.contains("manual testing") {
        Some(CriteriaSection::Manual)
    } else {
        None
    }
}

/// Extract automated and manual verification items.
///
/// A line naming "Automated Verification" or "Manual Verification" opens a
/// list; bullets are collected until any heading closes it. Checkbox
/// markers are stripped from items and empty items are skipped.
pub fn parse_success_criteria(content: &str) -> SuccessCriteria {
    let mut criteria = SuccessCriteria::default();
    let mut section = CriteriaSection::None;

    for line in content.lines() {
        if let Some(marker) = criteria_marker(line) {
            section = marker;
            continue;
        }

        let kind = classify(line);
        if kind.is_heading() {
            section = CriteriaSection::None;
            continue;
        }

        let item = match kind {
            LineKind::Bullet { text } => patterns::CHECKBOX_PREFIX.replace(text, "").trim().to_string(),
            LineKind::Task { body, .. } => body.trim().to_string(),
            _ => continue,
        };
        if item.is_empty() {
            continue;
        }

        match section {
            CriteriaSection::Automated => criteria.automated.push(item),
            CriteriaSection::Manual => criteria.manual.push(item),
            CriteriaSection::None => {}
        }
    }

    criteria
}

/// Lines examined after a phase header when looking for its description
const DESCRIPTION_WINDOW: usize = 10;

/// Find a phase header by number and return `(name, description)`.
///
/// The description is the first plain text line within the next
/// [`DESCRIPTION_WINDOW`] lines, skipping blanks, headings and bullets,
/// and stopping at the next phase header.
pub fn find_phase(content: &str, number: u32) -> Option<(String, Option<String>)> {
    let lines: Vec<&str> = content.lines().collect();

    let (idx, name) = lines.iter().enumerate().find_map(|(idx, line)| match classify(line) {
        LineKind::PhaseHeader { number: n, name, .. } if n == number => Some((idx, name)),
        _ => None,
    })?;

    let description = lines
        .iter()
        .skip(idx + 1)
        .take(DESCRIPTION_WINDOW)
        .map(|line| classify(line))
        .take_while(|kind| !matches!(kind, LineKind::PhaseHeader { .. }))
        .find_map(|kind| match kind {
            // `---` rules and `-item` lines are not prose
            LineKind::Text(text) if !text.trim_start().starts_with('-') => {
                Some(text.trim().to_string())
            }
            _ => None,
        });

    Some((name.to_string(), description))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKS: &str = r#"# Tasks: Add Retry Logic

- [ ] Orphan task before any phase

## Phase 1: Foundation

- [x] Create retry policy - src/retry.rs - 2h - none
- [ ] Wire policy into client - src/client.rs

### Phase 2: Integration

- [X] Add tests - tests/retry.rs - 1h - Phase 1
- [ ] Update docs
"#;

    #[test]
    fn test_classify_lines() {
        assert_eq!(
            classify("## Phase 3:  Rollout  "),
            LineKind::PhaseHeader {
                level: 2,
                number: 3,
                name: "Rollout"
            }
        );
        assert_eq!(
            classify("# Phase 1: Top level"),
            LineKind::Heading {
                level: 1,
                text: "Phase 1: Top level"
            }
        );
        assert_eq!(
            classify("- [x] Done thing"),
            LineKind::Task {
                status: TaskStatus::Done,
                body: "Done thing"
            }
        );
        assert_eq!(classify("* item"), LineKind::Bullet { text: "item" });
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify("plain"), LineKind::Text("plain"));
    }

    #[test]
    fn test_parse_tasks_with_phases() {
        let parsed = parse_tasks(TASKS);

        assert_eq!(parsed.phases.len(), 2);
        assert_eq!(parsed.phases[0].number, 1);
        assert_eq!(parsed.phases[0].name, "Foundation");
        assert_eq!(parsed.phases[1].name, "Integration");

        assert_eq!(parsed.tasks.len(), 5);
        assert_eq!(parsed.tasks[0].phase, None);
        assert_eq!(parsed.tasks[0].line, 3);

        let first = &parsed.tasks[1];
        assert_eq!(first.description, "Create retry policy");
        assert_eq!(first.file, "src/retry.rs");
        assert_eq!(first.effort, "2h");
        assert_eq!(first.dependencies, "none");
        assert_eq!(first.status, TaskStatus::Done);
        assert_eq!(first.phase, Some(1));

        let partial = &parsed.tasks[2];
        assert_eq!(partial.file, "src/client.rs");
        assert_eq!(partial.effort, "");
        assert_eq!(partial.dependencies, "");

        assert_eq!(parsed.tasks[3].status, TaskStatus::Done);
        assert_eq!(parsed.tasks[3].phase, Some(2));
        assert_eq!(parsed.tasks[4].description, "Update docs");
    }

    #[test]
    fn test_task_fields_only_split_on_spaced_hyphen() {
        let [desc, file, _, _] = split_task_fields("Use well-known port - src/net-config.rs");
        assert_eq!(desc, "Use well-known port");
        assert_eq!(file, "src/net-config.rs");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("intro\n# Add Retry Logic  \n## Overview\n"),
            Some("Add Retry Logic".to_string())
        );
        assert_eq!(extract_title("## Only level two\n"), None);
        assert_eq!(extract_title(""), None);
    }

    #[test]
    fn test_parse_success_criteria() {
        let content = r#"# Plan

## Phase 1: Foundation

### Success Criteria:

#### Automated Verification:
- [ ] Unit tests pass: `cargo test`
- Lints pass

#### Manual Verification:
* [x] Retry visible in logs
-

## Phase 2: Integration

- not a criterion
**Automated Verification:**
- Integration suite passes
"#;
        let criteria = parse_success_criteria(content);
        assert_eq!(
            criteria.automated,
            vec![
                "Unit tests pass: `cargo test`",
                "Lints pass",
                "Integration suite passes"
            ]
        );
        assert_eq!(criteria.manual, vec!["Retry visible in logs"]);
    }

    #[test]
    fn test_find_phase_with_description() {
        let content = r#"# Plan

## Phase 1: Foundation

### Overview
Introduce the retry policy type.

- bullet ignored

## Phase 2: Integration
"#;
        let (name, desc) = find_phase(content, 1).unwrap();
        assert_eq!(name, "Foundation");
        assert_eq!(desc.as_deref(), Some("Introduce the retry policy type."));
    }

    #[test]
    fn test_find_phase_skips_horizontal_rule() {
        let content = "# T\n\n## Phase 1: Foundation\n---\n-no space\nReal description.\n";
        let (name, desc) = find_phase(content, 1).unwrap();
        assert_eq!(name, "Foundation");
        assert_eq!(desc.as_deref(), Some("Real description."));
    }

    #[test]
    fn test_find_phase_description_stops_at_next_phase() {
        let content = "## Phase 1: A\n\n## Phase 2: B\nBelongs to B\n";
        let (name, desc) = find_phase(content, 1).unwrap();
        assert_eq!(name, "A");
        assert_eq!(desc, None);
        assert!(find_phase(content, 9).is_none());
    }

    #[test]
    fn test_malformed_markdown_graceful() {
        let parsed = parse_tasks("- [] not a task\n-[x] nor this\n## Phase x: bad number\n");
        assert!(parsed.tasks.is_empty());
        assert!(parsed.phases.is_empty());
    }
}
