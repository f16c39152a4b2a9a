use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::vcs::{CommitOutcome, PullOutcome, Repository};

/// In-memory stand-in that counts calls and serves scripted revisions.
#[derive(Default)]
pub(crate) struct FakeRepository {
    pub local: Mutex<Option<String>>,
    pub remote: Mutex<Option<String>>,
    pub resets: AtomicUsize,
    pub commits: AtomicUsize,
    pub pulls: AtomicUsize,
}

impl FakeRepository {
    pub fn with_revisions(local: Option<&str>, remote: Option<&str>) -> Self {
        Self {
            local: Mutex::new(local.map(str::to_string)),
            remote: Mutex::new(remote.map(str::to_string)),
            ..Default::default()
        }
    }
}

impl Repository for FakeRepository {
    fn local_revision(&self) -> Result<Option<String>> {
        Ok(self.local.lock().unwrap().clone())
    }

    fn remote_revision(&self) -> Result<Option<String>> {
        Ok(self.remote.lock().unwrap().clone())
    }

    fn reset_to_tracked(&self) -> Result<usize> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    fn commit_and_push(&self, _message: &str) -> Result<CommitOutcome> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(CommitOutcome::Committed {
            revision: format!("rev{}", n),
        })
    }

    fn pull(&self) -> Result<PullOutcome> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let remote = self.remote.lock().unwrap().clone();
        *self.local.lock().unwrap() = remote;
        Ok(PullOutcome {
            up_to_date: false,
            files_changed: 1,
            message: "Fast-forward".to_string(),
        })
    }
}

pub(crate) fn test_config(path_in: &Path, path_out: &Path, patterns: &[&str]) -> SyncConfig {
    SyncConfig {
        path_in: dunce::canonicalize(path_in).unwrap(),
        path_out: dunce::canonicalize(path_out).unwrap(),
        update_interval: 1,
        file_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        remote_name: "origin".to_string(),
        commit_message: "New Commit".to_string(),
        preserved_files: vec!["README.md".to_string()],
    }
}
