//! Version-control error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by git commands. All of them abort the calling loop.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to run `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Merge conflict while pulling: {0}")]
    MergeConflict(String),

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Unexpected output from `git {command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// Classifies a failed pull into a conflict or a plain command failure.
pub fn classify_pull_error(command: &str, message: String) -> VcsError {
    let lower = message.to_lowercase();
    if message.contains("CONFLICT") || lower.contains("merge conflict") {
        VcsError::MergeConflict(message)
    } else {
        VcsError::CommandFailed {
            command: command.to_string(),
            message,
        }
    }
}
