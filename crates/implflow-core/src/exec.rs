//! External command execution
//!
//! Every git and hosting-CLI call goes through [`CommandRunner`], a narrow
//! seam taking (program, args, working dir) and returning
//! (status, stdout, stderr). Tests substitute a scripted runner.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ImplflowError;

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Upper bound on run time; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg arg ...` for messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured output of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs external commands
pub trait CommandRunner {
    /// Run a command to completion.
    ///
    /// A non-zero exit is not an error at this level; errors are reserved
    /// for spawn failures and timeouts.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ImplflowError>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ImplflowError> {
        if !spec.cwd.is_dir() {
            return Err(ImplflowError::NotFound {
                path: spec.cwd.clone(),
            });
        }

        tracing::debug!(command = %spec.display(), cwd = %spec.cwd.display(), "running");

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ImplflowError::ToolNotInstalled {
                        tool: spec.program.clone(),
                    }
                } else {
                    ImplflowError::Io(e)
                }
            })?;

        // Drain pipes on helper threads so a chatty child cannot block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match spec.timeout {
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(command = %spec.display(), secs = limit.as_secs(), "command timed out");
                    return Err(ImplflowError::Timeout {
                        command: spec.display(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let output = CommandOutput {
            status: status.code().unwrap_or(-1),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        tracing::debug!(command = %spec.display(), status = output.status, "finished");
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        let spec = CommandSpec::new("git", ["push", "-u", "origin", "b"], Path::new("."));
        assert_eq!(spec.display(), "git push -u origin b");
        assert_eq!(spec.timeout, None);
    }

    #[test]
    fn test_system_runner_captures_output() {
        let temp = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sh", ["-c", "echo out; echo err >&2; exit 3"], temp.path());
        let output = SystemRunner.run(&spec).unwrap();
        assert_eq!(output.status, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.success());
    }

    #[test]
    fn test_system_runner_timeout() {
        let temp = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sh", ["-c", "sleep 5"], temp.path())
            .with_timeout(Duration::from_millis(200));
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, ImplflowError::Timeout { .. }));
    }

    #[test]
    fn test_system_runner_missing_binary() {
        let temp = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("implflow-no-such-binary", Vec::<String>::new(), temp.path());
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, ImplflowError::ToolNotInstalled { .. }));
    }

    #[test]
    fn test_system_runner_missing_cwd() {
        let spec = CommandSpec::new("sh", ["-c", "true"], Path::new("/no/such/dir/here"));
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, ImplflowError::NotFound { .. }));
    }
}
