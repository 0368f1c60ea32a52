//! Typed git helper over a [`CommandRunner`]

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ImplflowConfig;
use crate::error::ImplflowError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

/// Git CLI wrapper bound to one working directory
#[derive(Clone)]
pub struct GitCli<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    dir: PathBuf,
    timeout: Duration,
    network_timeout: Duration,
}

impl<'a> GitCli<'a> {
    /// Wrapper using the configured git binary and timeouts
    pub fn new(runner: &'a dyn CommandRunner, dir: &Path, config: &ImplflowConfig) -> Self {
        Self {
            runner,
            program: config.git_path.clone(),
            dir: dir.to_path_buf(),
            timeout: Duration::from_secs(config.command_timeout_secs),
            network_timeout: Duration::from_secs(config.network_timeout_secs),
        }
    }

    /// Same settings, different working directory
    pub fn at(&self, dir: &Path) -> GitCli<'a> {
        GitCli {
            dir: dir.to_path_buf(),
            ..self.clone()
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn spec(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new(&self.program, args.iter().copied(), &self.dir)
    }

    /// Run a read-only query under the command timeout, whatever the exit status
    fn output(&self, args: &[&str]) -> Result<CommandOutput, ImplflowError> {
        self.runner.run(&self.spec(args).with_timeout(self.timeout))
    }

    fn check(&self, args: &[&str], output: CommandOutput) -> Result<String, ImplflowError> {
        if output.success() {
            Ok(output.stdout.trim().to_string())
        } else {
            Err(ImplflowError::ExternalTool {
                tool: "git".to_string(),
                command: args.join(" "),
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Run and return trimmed stdout, failing on a non-zero exit
    fn run(&self, args: &[&str]) -> Result<String, ImplflowError> {
        let output = self.output(args)?;
        self.check(args, output)
    }

    /// Run a mutating command without a time bound.
    ///
    /// Commits, staging and checkouts run user hooks and write whole trees,
    /// so only the caller's process can cut them short.
    fn mutate(&self, args: &[&str]) -> Result<String, ImplflowError> {
        let output = self.runner.run(&self.spec(args))?;
        self.check(args, output)
    }

    /// Absolute path of the working tree containing `dir`
    pub fn show_toplevel(&self) -> Result<PathBuf, ImplflowError> {
        let output = self.output(&["rev-parse", "--show-toplevel"])?;
        if !output.success() {
            return Err(ImplflowError::NotAGitRepository {
                path: self.dir.clone(),
            });
        }
        Ok(PathBuf::from(output.stdout.trim()))
    }

    /// Root of the main checkout, even when `dir` is inside a linked worktree
    pub fn main_repo_root(&self) -> Result<PathBuf, ImplflowError> {
        let output = self.output(&["rev-parse", "--git-common-dir"])?;
        if !output.success() {
            return Err(ImplflowError::NotAGitRepository {
                path: self.dir.clone(),
            });
        }
        let common = PathBuf::from(output.stdout.trim());
        let common = if common.is_absolute() {
            common
        } else {
            self.dir.join(common)
        };
        let common = common.canonicalize().unwrap_or(common);
        common
            .parent()
            .map(Path::to_path_buf)
            .ok_or(ImplflowError::NotAGitRepository {
                path: self.dir.clone(),
            })
    }

    /// Name of the checked-out branch (`HEAD` when detached)
    pub fn current_branch(&self) -> Result<String, ImplflowError> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Whether a local branch with this name exists
    pub fn branch_exists(&self, branch: &str) -> Result<bool, ImplflowError> {
        let reference = format!("refs/heads/{}", branch);
        let output = self.output(&["rev-parse", "--verify", "--quiet", &reference])?;
        Ok(output.success())
    }

    pub fn head_hash(&self) -> Result<String, ImplflowError> {
        self.run(&["rev-parse", "HEAD"])
    }

    /// `worktree add -b <branch> <path> <base>`
    pub fn worktree_add_new_branch(
        &self,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<(), ImplflowError> {
        let path = path_arg(path)?;
        self.mutate(&["worktree", "add", "-b", branch, path, base])?;
        Ok(())
    }

    pub fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), ImplflowError> {
        let path = path_arg(path)?;
        if force {
            self.mutate(&["worktree", "remove", "--force", path])?;
        } else {
            self.mutate(&["worktree", "remove", path])?;
        }
        Ok(())
    }

    /// Prune stale worktree metadata
    pub fn worktree_prune(&self) -> Result<(), ImplflowError> {
        self.run(&["worktree", "prune"])?;
        Ok(())
    }

    /// Files with unstaged (`cached = false`) or staged changes
    pub fn diff_names(&self, cached: bool) -> Result<Vec<String>, ImplflowError> {
        let stdout = if cached {
            self.run(&["diff", "--cached", "--name-only"])?
        } else {
            self.run(&["diff", "--name-only"])?
        };
        Ok(lines(&stdout))
    }

    /// Untracked files not covered by an ignore rule
    pub fn untracked(&self) -> Result<Vec<String>, ImplflowError> {
        let stdout = self.run(&["ls-files", "--others", "--exclude-standard"])?;
        Ok(lines(&stdout))
    }

    pub fn add_all(&self) -> Result<(), ImplflowError> {
        self.mutate(&["add", "-A"])?;
        Ok(())
    }

    pub fn add_path(&self, path: &Path) -> Result<(), ImplflowError> {
        self.mutate(&["add", path_arg(path)?])?;
        Ok(())
    }

    /// Whether the index differs from HEAD
    pub fn has_staged_changes(&self) -> Result<bool, ImplflowError> {
        let args = ["diff", "--cached", "--quiet"];
        let output = self.output(&args)?;
        match output.status {
            0 => Ok(false),
            1 => Ok(true),
            _ => self.check(&args, output).map(|_| false),
        }
    }

    pub fn commit(&self, message: &str) -> Result<(), ImplflowError> {
        self.mutate(&["commit", "-m", message])?;
        Ok(())
    }

    /// `show --stat --oneline HEAD`
    pub fn show_stat(&self) -> Result<String, ImplflowError> {
        self.run(&["show", "--stat", "--oneline", "HEAD"])
    }

    /// Subjects of commits in `base..head`, oldest last.
    ///
    /// An unknown base (e.g. never fetched) yields an empty list with a warning.
    pub fn log_subjects(&self, base: &str, head: &str) -> Vec<String> {
        let range = format!("{}..{}", base, head);
        match self.run(&["log", "--oneline", &range]) {
            Ok(stdout) => lines(&stdout)
                .into_iter()
                .filter_map(|line| line.split_once(' ').map(|(_, subject)| subject.to_string()))
                .collect(),
            Err(e) => {
                tracing::warn!(%range, error = %e, "could not list commits");
                Vec::new()
            }
        }
    }

    /// `push -u <remote> <branch>` under the network timeout
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<(), ImplflowError> {
        let args = ["push", "-u", remote, branch];
        let output = self
            .runner
            .run(&self.spec(&args).with_timeout(self.network_timeout))?;
        self.check(&args, output)?;
        Ok(())
    }

    /// `checkout -b <branch> <base>`
    pub fn checkout_new_branch(&self, branch: &str, base: &str) -> Result<(), ImplflowError> {
        self.mutate(&["checkout", "-b", branch, base])?;
        Ok(())
    }
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn path_arg(path: &Path) -> Result<&str, ImplflowError> {
    path.to_str().ok_or_else(|| ImplflowError::Parse {
        message: format!("path is not valid UTF-8: {}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeRunner;

    fn git<'a>(runner: &'a FakeRunner) -> GitCli<'a> {
        GitCli::new(runner, Path::new("/repo"), &ImplflowConfig::default())
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let runner = FakeRunner::new().on(&["commit"], 1, "", "  nothing to commit\n");
        let err = git(&runner).commit("msg").unwrap_err();
        match err {
            ImplflowError::ExternalTool { tool, command, stderr } => {
                assert_eq!(tool, "git");
                assert_eq!(command, "commit -m msg");
                assert_eq!(stderr, "nothing to commit");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_branch_exists_uses_local_ref() {
        let runner = FakeRunner::new().on(&["rev-parse"], 1, "", "");
        assert!(!git(&runner).branch_exists("issue-1").unwrap());
        assert_eq!(
            runner.call_lines(),
            vec!["rev-parse --verify --quiet refs/heads/issue-1"]
        );
    }

    #[test]
    fn test_has_staged_changes_status_mapping() {
        let runner = FakeRunner::new()
            .on(&["diff"], 0, "", "")
            .on(&["diff"], 1, "", "")
            .on(&["diff"], 128, "", "fatal: bad revision");
        let git = git(&runner);
        assert!(!git.has_staged_changes().unwrap());
        assert!(git.has_staged_changes().unwrap());
        assert!(git.has_staged_changes().is_err());
    }

    #[test]
    fn test_log_subjects_strips_hashes_and_degrades() {
        let runner = FakeRunner::new()
            .on(&["log"], 0, "abc1234 Phase 2: Wire it\ndef5678 Phase 1: Start\n", "")
            .on(&["log"], 128, "", "unknown revision");
        let git = git(&runner);
        assert_eq!(
            git.log_subjects("main", "issue-1"),
            vec!["Phase 2: Wire it", "Phase 1: Start"]
        );
        assert!(git.log_subjects("nope", "issue-1").is_empty());
    }

    #[test]
    fn test_push_uses_network_timeout() {
        let runner = FakeRunner::new();
        let config = ImplflowConfig {
            network_timeout_secs: 90,
            ..ImplflowConfig::default()
        };
        GitCli::new(&runner, Path::new("/repo"), &config)
            .push_upstream("origin", "issue-1")
            .unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].args, vec!["push", "-u", "origin", "issue-1"]);
        assert_eq!(calls[0].timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_mutating_commands_are_unbounded() {
        let runner = FakeRunner::new();
        let config = ImplflowConfig {
            command_timeout_secs: 1,
            ..ImplflowConfig::default()
        };
        let git = GitCli::new(&runner, Path::new("/repo"), &config);
        git.add_all().unwrap();
        git.commit("Phase 1: A").unwrap();
        git.worktree_add_new_branch(Path::new("/work/repo-x"), "x", "main")
            .unwrap();
        git.checkout_new_branch("y", "main").unwrap();
        git.head_hash().unwrap();

        let calls = runner.calls.borrow();
        for call in &calls[..4] {
            assert_eq!(call.timeout, None, "{} should not be bounded", call.display());
        }
        assert_eq!(calls[4].timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_show_toplevel_outside_repo() {
        let runner = FakeRunner::new().on(&["rev-parse"], 128, "", "fatal: not a git repository");
        let err = git(&runner).show_toplevel().unwrap_err();
        assert!(matches!(err, ImplflowError::NotAGitRepository { .. }));
    }
}
