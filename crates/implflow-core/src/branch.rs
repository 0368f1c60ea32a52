//! Branch naming for plan directories
//!
//! The branch name is a pure function of the plan directory: its path, the
//! names of the files inside it, and the title line of the plan document.
//! Re-deriving it must always produce the same string.

use std::path::{Component, Path};

use crate::error::ImplflowError;
use crate::plan::PlanFiles;

/// Maximum length of the title slug in an issue branch name
pub const MAX_SLUG_LEN: usize = 40;

/// Prefixes of branches created by this workflow
pub const BRANCH_PREFIXES: [&str; 2] = ["issue-", "feature-"];

/// Convert free text to a branch-safe slug.
///
/// Lowercases, turns whitespace/underscore runs into hyphens, drops
/// everything outside `[a-z0-9-]`, and collapses/trims hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }

    slug
}

/// Truncate a slug to `max` characters without leaving a trailing hyphen
pub fn truncate_slug(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    slug[..max].trim_end_matches('-').to_string()
}

/// Whether a branch follows the `issue-*` / `feature-*` convention
pub fn is_implementation_branch(branch: &str) -> bool {
    BRANCH_PREFIXES.iter().any(|p| branch.starts_with(p))
}

/// Issue number embedded in a plan directory.
///
/// Checks for an `issues/<digits>` path segment first, then for a plan file
/// named `<digits>-...plan.md` inside the directory.
pub fn extract_issue_number(plan_dir: &Path) -> Option<u64> {
    let resolved = plan_dir
        .canonicalize()
        .unwrap_or_else(|_| plan_dir.to_path_buf());
    let components: Vec<&str> = resolved
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let from_path = components.windows(2).find_map(|pair| {
        if pair[0] == "issues" && is_digits(pair[1]) {
            pair[1].parse().ok()
        } else {
            None
        }
    });
    if from_path.is_some() {
        return from_path;
    }

    PlanFiles::matching(plan_dir, "-plan.md")
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() && name[digits.len()..].starts_with('-') {
                digits.parse().ok()
            } else {
                None
            }
        })
        .next()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Title of the plan document (first level-1 heading), if any
pub fn plan_title(plan_dir: &Path) -> Option<String> {
    let plan_file = PlanFiles::matching(plan_dir, "-plan.md").into_iter().next()?;
    let content = std::fs::read_to_string(&plan_file).ok()?;
    crate::parser::extract_title(&content)
}

/// Derive the canonical branch name for a plan directory.
///
/// - `issue-<n>-<title-slug>` when an issue number and title are found
/// - `issue-<n>` when the plan has no title heading
/// - `feature-<dir-slug>` for ad-hoc plans
pub fn branch_name(plan_dir: &Path) -> Result<String, ImplflowError> {
    if !plan_dir.is_dir() {
        return Err(ImplflowError::PlanNotFound {
            path: plan_dir.to_path_buf(),
        });
    }

    if let Some(issue) = extract_issue_number(plan_dir) {
        let slug = plan_title(plan_dir)
            .map(|title| truncate_slug(&slugify(&title), MAX_SLUG_LEN))
            .filter(|slug| !slug.is_empty());
        return Ok(match slug {
            Some(slug) => format!("issue-{}-{}", issue, slug),
            None => {
                tracing::warn!(plan = %plan_dir.display(), "plan has no title heading, using issue number only");
                format!("issue-{}", issue)
            }
        });
    }

    let canonical = plan_dir.canonicalize()?;
    let dir_name = canonical
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok(format!("feature-{}", slugify(dir_name)))
}
