use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sync configuration, loaded once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Working directory a human edits (source on upload, consumer on download).
    pub path_in: PathBuf,
    /// Version-controlled mirror directory.
    pub path_out: PathBuf,
    /// Seconds between pushes (upload) or remote probes (download).
    pub update_interval: u64,
    /// Glob patterns selecting what gets synced.
    pub file_patterns: Vec<String>,
    /// Remote the mirror pushes to and pulls from.
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
    /// Message used for every periodic commit.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Top-level mirror entries that survive a reset besides `.git`.
    #[serde(default = "default_preserved_files")]
    pub preserved_files: Vec<String>,
}

fn default_remote_name() -> String {
    "origin".to_string()
}

fn default_commit_message() -> String {
    "New Commit".to_string()
}

fn default_preserved_files() -> Vec<String> {
    vec!["README.md".to_string()]
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }
}

/// Directional view of the two configured roots.
///
/// Upload reads from `path_in` and writes into `path_out`; download is the
/// reverse. Building a view keeps the config itself untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoots {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl SyncRoots {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Source tree into mirror tree.
    pub fn upload(config: &SyncConfig) -> Self {
        Self::new(&config.path_in, &config.path_out)
    }

    /// Mirror tree into consumer tree.
    pub fn download(config: &SyncConfig) -> Self {
        Self::new(&config.path_out, &config.path_in)
    }

    pub fn reversed(&self) -> Self {
        Self::new(&self.to, &self.from)
    }

    pub fn from_root(&self) -> &Path {
        &self.from
    }

    pub fn to_root(&self) -> &Path {
        &self.to
    }
}
