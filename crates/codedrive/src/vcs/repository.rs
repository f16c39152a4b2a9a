//! Git repository operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, info};

use super::error::{classify_pull_error, VcsError};
use super::parse::{branch_tracking, diffstat_files, failure_message, ls_remote_head};
use super::types::{CommitOutcome, PullOutcome};
use super::Repository;
use crate::config::SyncConfig;
use crate::error::{FsError, Result};
use crate::sync::file_ops::delete_path;
use crate::sync::scan::VCS_METADATA_DIR;

/// Git working copy used as the mirror root.
#[derive(Debug, Clone)]
pub struct GitRepository {
    /// Path to the working copy.
    repo_path: PathBuf,
    /// Remote to push to and pull from.
    remote_name: String,
    /// Top-level entries kept by [`Repository::reset_to_tracked`].
    preserved_files: Vec<String>,
}

impl GitRepository {
    /// Creates a handle for `repo_path` using `remote_name` and the default preserved set.
    pub fn new(repo_path: impl Into<PathBuf>, remote_name: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            remote_name: remote_name.into(),
            preserved_files: vec!["README.md".to_string()],
        }
    }

    /// Handle for the mirror root of `config`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.path_out, &config.remote_name)
            .with_preserved_files(config.preserved_files.clone())
    }

    pub fn with_preserved_files(mut self, preserved_files: Vec<String>) -> Self {
        self.preserved_files = preserved_files;
        self
    }

    /// Returns the repository path.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// Checks if the directory is a git repository.
    pub fn is_git_repo(&self) -> bool {
        self.repo_path.join(VCS_METADATA_DIR).exists()
    }

    /// Fails with [`VcsError::NotARepository`] unless the path is a working copy.
    pub fn ensure_repository(&self) -> std::result::Result<(), VcsError> {
        if self.is_git_repo() {
            Ok(())
        } else {
            Err(VcsError::NotARepository(self.repo_path.clone()))
        }
    }

    /// Initializes a git repository if one doesn't exist.
    pub fn init(&self) -> std::result::Result<(), VcsError> {
        if self.is_git_repo() {
            return Ok(());
        }
        self.run_checked(&["init"])?;
        Ok(())
    }

    /// URL of the configured remote.
    pub fn remote_url(&self) -> std::result::Result<String, VcsError> {
        let url = self.run_checked(&["remote", "get-url", &self.remote_name])?;
        Ok(url.trim().to_string())
    }

    /// Branch HEAD points at, `None` when detached.
    pub fn current_branch(&self) -> std::result::Result<Option<String>, VcsError> {
        let output = self.run_git(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    /// True when the index differs from HEAD (or holds anything on an unborn branch).
    fn has_staged_changes(&self) -> std::result::Result<bool, VcsError> {
        let args = ["diff", "--cached", "--quiet"];
        let output = self.run_git(&args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(command_failed(&args, &output)),
        }
    }

    /// Commits the upstream branch has not seen yet, 0 without an upstream.
    fn unpushed_commits(&self) -> std::result::Result<u32, VcsError> {
        let status = self.run_checked(&["status", "--porcelain", "-b"])?;
        Ok(status
            .lines()
            .find(|line| line.starts_with("##"))
            .and_then(branch_tracking)
            .map(|tracking| {
                if tracking.behind > 0 {
                    debug!("Mirror is {} commit(s) behind upstream", tracking.behind);
                }
                tracking.ahead
            })
            .unwrap_or(0))
    }

    fn push(&self) -> std::result::Result<(), VcsError> {
        self.run_checked(&["push", &self.remote_name, "HEAD"])?;
        Ok(())
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    /// Runs a git command in the repository directory.
    fn run_git(&self, args: &[&str]) -> std::result::Result<Output, VcsError> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(args)
            .output()
            .map_err(|e| VcsError::Spawn {
                command: args.join(" "),
                source: e,
            })
    }

    /// Runs a git command and returns stdout, failing on a non-zero exit.
    fn run_checked(&self, args: &[&str]) -> std::result::Result<String, VcsError> {
        let output = self.run_git(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(command_failed(args, &output))
        }
    }
}

fn command_failed(args: &[&str], output: &Output) -> VcsError {
    VcsError::CommandFailed {
        command: args.join(" "),
        message: failure_message(output),
    }
}

impl Repository for GitRepository {
    fn local_revision(&self) -> Result<Option<String>> {
        self.ensure_repository()?;
        let output = self.run_git(&["rev-parse", "--verify", "--quiet", "HEAD"])?;
        if !output.status.success() {
            // Unborn branch: no commit yet.
            return Ok(None);
        }
        let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!revision.is_empty()).then_some(revision))
    }

    fn remote_revision(&self) -> Result<Option<String>> {
        let url = self.remote_url()?;
        let listing = self.run_checked(&["ls-remote", &url, "HEAD"])?;
        Ok(ls_remote_head(&listing))
    }

    fn reset_to_tracked(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.repo_path).map_err(|e| FsError::Read {
            path: self.repo_path.clone(),
            source: e,
        })?;

        let mut doomed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::Read {
                path: self.repo_path.clone(),
                source: e,
            })?;
            let name = entry.file_name();
            let keep = name == VCS_METADATA_DIR
                || self.preserved_files.iter().any(|p| name == p.as_str());
            if !keep {
                doomed.push(entry.path());
            }
        }
        doomed.sort();

        for path in &doomed {
            delete_path(path)?;
        }

        info!(
            "Reset {}: removed {} entries",
            self.repo_path.display(),
            doomed.len()
        );
        Ok(doomed.len())
    }

    fn commit_and_push(&self, message: &str) -> Result<CommitOutcome> {
        self.ensure_repository()?;
        self.run_checked(&["add", "--all"])?;

        if !self.has_staged_changes()? {
            let pending = self.unpushed_commits()?;
            if pending == 0 {
                debug!("Nothing to commit in {}", self.repo_path.display());
                return Ok(CommitOutcome::NothingToCommit);
            }
            info!("Pushing {} pending commit(s)", pending);
            self.push()?;
            return Ok(CommitOutcome::PushedPending { commits: pending });
        }

        self.run_checked(&["commit", "--quiet", "-m", message])?;
        let revision = self
            .local_revision()?
            .ok_or_else(|| VcsError::UnexpectedOutput {
                command: "rev-parse HEAD".to_string(),
                output: "no revision after commit".to_string(),
            })?;
        self.push()?;

        info!("Committed and pushed {}", revision);
        Ok(CommitOutcome::Committed { revision })
    }

    fn pull(&self) -> Result<PullOutcome> {
        self.ensure_repository()?;

        let branch = self.current_branch()?;
        let mut args = vec!["pull", "--no-rebase", "--no-edit", self.remote_name.as_str()];
        if let Some(branch) = branch.as_deref() {
            args.push(branch);
        }

        let output = self.run_git(&args)?;
        if !output.status.success() {
            return Err(classify_pull_error(&args.join(" "), failure_message(&output)).into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let up_to_date = stdout.contains("Already up to date");
        let files_changed = if up_to_date {
            0
        } else {
            diffstat_files(&stdout)
        };

        info!(
            "Pulled {} ({} files changed)",
            self.repo_path.display(),
            files_changed
        );
        Ok(PullOutcome {
            up_to_date,
            files_changed,
            message: stdout,
        })
    }
}
