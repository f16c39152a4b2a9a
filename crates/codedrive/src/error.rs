use std::path::{Path, PathBuf};
use thiserror::Error;

pub use crate::vcs::VcsError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error(transparent)]
    PathScope(#[from] PathScopeError),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configured {field} '{path}' does not exist")]
    RootNotFound { field: &'static str, path: PathBuf },

    #[error("Configured {field} '{path}' is not a directory")]
    NotADirectory { field: &'static str, path: PathBuf },
}

/// A path was handed to a component that only accepts paths under a given root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Path '{path}' is not inside root '{root}'")]
pub struct PathScopeError {
    pub path: PathBuf,
    pub root: PathBuf,
}

impl PathScopeError {
    pub fn new(path: &Path, root: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FsError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed under '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
