//! Isolated sync environment: source, mirror and consumer trees plus a
//! local bare remote, all under one temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use codedrive::SyncConfig;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Tree the uploader watches.
    pub source_dir: PathBuf,
    /// Upload-side clone of the remote.
    pub mirror_dir: PathBuf,
    /// Download-side clone of the remote.
    pub peer_dir: PathBuf,
    /// Tree the downloader writes into.
    pub consumer_dir: PathBuf,
    /// Bare repository both clones push to and pull from.
    pub remote_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = dunce::canonicalize(temp_dir.path()).expect("Failed to resolve temp directory");

        let source_dir = base.join("source");
        let consumer_dir = base.join("consumer");
        let remote_dir = base.join("remote.git");
        std::fs::create_dir_all(&source_dir).expect("Failed to create source dir");
        std::fs::create_dir_all(&consumer_dir).expect("Failed to create consumer dir");

        git(&base, &["init", "--quiet", "--bare", "--initial-branch=main", "remote.git"]);

        let mirror_dir = clone(&base, "mirror");
        let peer_dir = clone(&base, "peer");

        Self {
            temp_dir,
            source_dir,
            mirror_dir,
            peer_dir,
            consumer_dir,
            remote_dir,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config for the upload side: source tree into the mirror clone.
    pub fn upload_config(&self, patterns: &[&str]) -> SyncConfig {
        config(&self.source_dir, &self.mirror_dir, patterns)
    }

    /// Config for the download side: peer clone into the consumer tree.
    pub fn download_config(&self, patterns: &[&str]) -> SyncConfig {
        config(&self.consumer_dir, &self.peer_dir, patterns)
    }

    /// Writes `config` as JSON next to the trees and returns its path.
    pub fn write_config(&self, name: &str, config: &SyncConfig) -> PathBuf {
        let path = self.base().join(name);
        let json = serde_json::to_string_pretty(config).expect("Failed to serialize config");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.source_dir, relative, content)
    }

    pub fn write_mirror(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.mirror_dir, relative, content)
    }

    pub fn write_consumer(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.consumer_dir, relative, content)
    }

    /// Revision of `main` in the bare remote, `None` before the first push.
    pub fn remote_head(&self) -> Option<String> {
        let output = Command::new("git")
            .current_dir(&self.remote_dir)
            .args(["rev-parse", "--verify", "--quiet", "refs/heads/main"])
            .output()
            .expect("Failed to run git");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Sorted top-level entry names of `dir`.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn clone(base: &Path, name: &str) -> PathBuf {
    git(base, &["clone", "--quiet", "remote.git", name]);
    let dir = base.join(name);
    git(&dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&dir, &["config", "user.email", "test@test.com"]);
    git(&dir, &["config", "user.name", "Test"]);
    git(&dir, &["config", "commit.gpgsign", "false"]);
    git(&dir, &["config", "branch.main.remote", "origin"]);
    git(&dir, &["config", "branch.main.merge", "refs/heads/main"]);
    dir
}

fn config(path_in: &Path, path_out: &Path, patterns: &[&str]) -> SyncConfig {
    SyncConfig {
        path_in: path_in.to_path_buf(),
        path_out: path_out.to_path_buf(),
        update_interval: 1,
        file_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        remote_name: "origin".to_string(),
        commit_message: "New Commit".to_string(),
        preserved_files: vec!["README.md".to_string()],
    }
}

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}
