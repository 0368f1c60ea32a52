//! JSON output formatting
//!
//! Every command prints exactly one envelope in `--json` mode, so callers can
//! branch on `status` and the process exit code alone.

use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use implflow_core::ImplflowError;

use crate::colors::PALETTE;

const SCHEMA_VERSION: &str = "1";

/// JSON response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for forward compatibility
    pub schema_version: String,
    /// Command that generated this response
    pub command: String,
    /// Status: "ok" or "error"
    pub status: String,
    /// Command-specific payload
    pub data: T,
    /// Errors and warnings
    pub issues: Vec<JsonIssue>,
}

impl<T> JsonResponse<T> {
    /// Create a successful response with issues
    pub fn ok_with_issues(command: &str, data: T, issues: Vec<JsonIssue>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            status: "ok".to_string(),
            data,
            issues,
        }
    }

    /// Create an error response
    pub fn error(command: &str, data: T, issues: Vec<JsonIssue>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            status: "error".to_string(),
            data,
            issues,
        }
    }
}

/// Issue object structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonIssue {
    /// Error/warning code (e.g., "E101")
    pub code: String,
    /// Severity level
    pub severity: String,
    /// Error category (not_found, already_exists, conflict, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: "warning".to_string(),
            kind: None,
            message: message.into(),
            file: None,
        }
    }
}

impl From<&ImplflowError> for JsonIssue {
    fn from(err: &ImplflowError) -> Self {
        let file = match err {
            ImplflowError::PlanNotFound { path }
            | ImplflowError::NotFound { path }
            | ImplflowError::PathConflict { path }
            | ImplflowError::PermissionDenied { path }
            | ImplflowError::NotAGitRepository { path } => Some(path.display().to_string()),
            ImplflowError::PlanFileNotFound { dir, .. } => Some(dir.display().to_string()),
            _ => None,
        };
        Self {
            code: err.code().to_string(),
            severity: "error".to_string(),
            kind: Some(err.kind().to_string()),
            message: err.to_string(),
            file,
        }
    }
}

/// Output flags shared by every command
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

impl OutputMode {
    /// Print the outcome of a command and return its exit code.
    ///
    /// `human` renders the success payload when not in JSON mode.
    pub fn finish<T: Serialize>(
        self,
        command: &str,
        result: Result<T, ImplflowError>,
        issues: Vec<JsonIssue>,
        human: impl FnOnce(&T),
    ) -> Result<i32, String> {
        match result {
            Ok(data) => {
                if self.json {
                    print_json(&JsonResponse::ok_with_issues(command, data, issues))?;
                } else {
                    for issue in &issues {
                        eprintln!("{} {}", "warning:".style(PALETTE.warning), issue.message);
                    }
                    if !self.quiet {
                        human(&data);
                    }
                }
                Ok(0)
            }
            Err(err) => {
                tracing::debug!(command, code = err.code(), "command failed");
                if self.json {
                    let mut all = vec![JsonIssue::from(&err)];
                    all.extend(issues);
                    print_json(&JsonResponse::error(command, serde_json::Value::Null, all))?;
                } else {
                    eprintln!("{} {}", "error:".style(PALETTE.error), err);
                }
                Ok(err.exit_code())
            }
        }
    }
}

fn print_json<T: Serialize>(response: &JsonResponse<T>) -> Result<(), String> {
    let text = serde_json::to_string_pretty(response).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_issue_from_error() {
        let err = ImplflowError::PathConflict {
            path: PathBuf::from("/work/app-issue-1"),
        };
        let issue = JsonIssue::from(&err);
        assert_eq!(issue.code, "E202");
        assert_eq!(issue.kind.as_deref(), Some("already_exists"));
        assert_eq!(issue.file.as_deref(), Some("/work/app-issue-1"));
    }

    #[test]
    fn test_envelope_shape() {
        let response = JsonResponse::ok_with_issues(
            "status",
            serde_json::json!({"total": 4}),
            vec![JsonIssue::warning("W001", "phase 1 appears twice")],
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["schema_version"], "1");
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["total"], 4);
        assert_eq!(value["issues"][0]["severity"], "warning");
        assert!(value["issues"][0].get("kind").is_none());
    }
}
