//! GitHub CLI wrapper

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ImplflowConfig;
use crate::error::ImplflowError;
use crate::exec::{CommandRunner, CommandSpec};

/// Arguments for `gh pr create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub base: &'a str,
    pub head: &'a str,
    pub draft: bool,
}

/// Hosting CLI bound to a working directory
pub struct GhCli<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    dir: PathBuf,
    timeout: Duration,
}

impl<'a> GhCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, dir: &Path, config: &ImplflowConfig) -> Self {
        Self {
            runner,
            program: config.gh_path.clone(),
            dir: dir.to_path_buf(),
            timeout: Duration::from_secs(config.network_timeout_secs),
        }
    }

    /// Open a pull request and return its URL
    pub fn create_pr(&self, request: &PrRequest<'_>) -> Result<String, ImplflowError> {
        let mut args = vec![
            "pr", "create", "--title", request.title, "--body", request.body, "--base",
            request.base, "--head", request.head,
        ];
        if request.draft {
            args.push("--draft");
        }

        let spec =
            CommandSpec::new(&self.program, args.iter().copied(), &self.dir).with_timeout(self.timeout);
        let output = self.runner.run(&spec)?;
        if !output.success() {
            return Err(ImplflowError::ExternalTool {
                tool: "gh".to_string(),
                command: "pr create".to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        // gh prints progress lines before the URL on some versions
        let url = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("http"))
            .last()
            .unwrap_or_else(|| output.stdout.trim())
            .to_string();
        Ok(url)
    }
}
