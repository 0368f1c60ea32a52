//! Error types for implflow operations

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for implflow operations
#[derive(Error, Debug)]
pub enum ImplflowError {
    // === NotFound family (E101-E106) ===
    /// E101: Plan directory does not exist
    #[error("E101: Plan directory not found: {}", path.display())]
    PlanNotFound { path: PathBuf },

    /// E102: Required plan document missing from the plan directory
    #[error("E102: No *-{kind}.md file found in {}", dir.display())]
    PlanFileNotFound { kind: String, dir: PathBuf },

    /// E103: No task line matched the pattern
    #[error("E103: No task found matching pattern: '{pattern}'")]
    TaskNotFound { pattern: String },

    /// E105: Generic path missing (worktree, tasks file, context file)
    #[error("E105: Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// E106: Directory is not inside a git repository
    #[error("E106: Not a git repository: {}", path.display())]
    NotAGitRepository { path: PathBuf },

    // === AlreadyExists family (E201-E202) ===
    /// E201: Branch ref already exists
    #[error("E201: Branch '{branch}' already exists")]
    BranchAlreadyExists { branch: String },

    /// E202: Worktree target path already exists
    #[error("E202: Worktree directory already exists: {}", path.display())]
    PathConflict { path: PathBuf },

    // === Conflict (E301) ===
    /// E301: Current branch does not match the branch derived from the plan
    #[error("E301: Expected to be on branch '{expected}', but currently on '{actual}'")]
    BranchMismatch { expected: String, actual: String },

    // === External tool failures (E401-E403) ===
    /// E401: External command exited non-zero
    #[error("E401: {tool} {command} failed: {stderr}")]
    ExternalTool {
        tool: String,
        command: String,
        stderr: String,
    },

    /// E402: External command exceeded its time bound
    #[error("E402: {command} timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    /// E403: External binary missing from PATH
    #[error("E403: {tool} not installed or not found in PATH")]
    ToolNotInstalled { tool: String },

    // === Filesystem (E501-E502) ===
    /// E501: Write rejected by the filesystem
    #[error("E501: Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// IO error
    #[error("E502: IO error: {0}")]
    Io(#[from] std::io::Error),

    // === Configuration and parsing (E601-E602) ===
    /// Configuration error
    #[error("E601: configuration error: {0}")]
    Config(String),

    /// Unparseable tool output or document structure
    #[error("E602: parse error: {message}")]
    Parse { message: String },
}

impl ImplflowError {
    /// Get the error code (e.g., "E101")
    pub fn code(&self) -> &'static str {
        match self {
            ImplflowError::PlanNotFound { .. } => "E101",
            ImplflowError::PlanFileNotFound { .. } => "E102",
            ImplflowError::TaskNotFound { .. } => "E103",
            ImplflowError::NotFound { .. } => "E105",
            ImplflowError::NotAGitRepository { .. } => "E106",
            ImplflowError::BranchAlreadyExists { .. } => "E201",
            ImplflowError::PathConflict { .. } => "E202",
            ImplflowError::BranchMismatch { .. } => "E301",
            ImplflowError::ExternalTool { .. } => "E401",
            ImplflowError::Timeout { .. } => "E402",
            ImplflowError::ToolNotInstalled { .. } => "E403",
            ImplflowError::PermissionDenied { .. } => "E501",
            ImplflowError::Io(_) => "E502",
            ImplflowError::Config(_) => "E601",
            ImplflowError::Parse { .. } => "E602",
        }
    }

    /// Taxonomy bucket this error belongs to
    pub fn kind(&self) -> &'static str {
        match self {
            ImplflowError::PlanNotFound { .. }
            | ImplflowError::PlanFileNotFound { .. }
            | ImplflowError::TaskNotFound { .. }
            | ImplflowError::NotFound { .. }
            | ImplflowError::NotAGitRepository { .. } => "not_found",
            ImplflowError::BranchAlreadyExists { .. } | ImplflowError::PathConflict { .. } => {
                "already_exists"
            }
            ImplflowError::BranchMismatch { .. } => "conflict",
            ImplflowError::ExternalTool { .. } | ImplflowError::ToolNotInstalled { .. } => {
                "external_tool_failure"
            }
            ImplflowError::Timeout { .. } => "timeout",
            ImplflowError::PermissionDenied { .. } => "permission_denied",
            ImplflowError::Io(_) | ImplflowError::Config(_) | ImplflowError::Parse { .. } => {
                "internal"
            }
        }
    }

    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            ImplflowError::PlanNotFound { .. }
            | ImplflowError::PlanFileNotFound { .. }
            | ImplflowError::TaskNotFound { .. }
            | ImplflowError::NotFound { .. } => 2, // Missing target

            ImplflowError::BranchAlreadyExists { .. } | ImplflowError::PathConflict { .. } => 3,

            ImplflowError::BranchMismatch { .. } => 4,

            ImplflowError::NotAGitRepository { .. } => 5,

            ImplflowError::ExternalTool { .. } | ImplflowError::ToolNotInstalled { .. } => 6,

            ImplflowError::Timeout { .. } => 7,

            ImplflowError::PermissionDenied { .. } => 8,

            ImplflowError::Io(_) | ImplflowError::Config(_) | ImplflowError::Parse { .. } => 1,
        }
    }

    /// Map an IO error raised while writing `path`, keeping permission failures distinct
    pub fn from_write(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            ImplflowError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            ImplflowError::Io(err)
        }
    }
}
