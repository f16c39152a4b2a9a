//! Version-control binding for the mirror tree.
//!
//! The orchestrators only see the [`Repository`] trait; [`GitRepository`]
//! implements it by running the `git` binary.

pub mod error;
pub mod parse;
pub mod repository;
pub mod types;

pub use error::VcsError;
pub use repository::GitRepository;
pub use types::{CommitOutcome, PullOutcome};

use crate::error::Result;

/// Operations the sync engine needs from a version-controlled mirror.
///
/// Implementations keep no state of their own; every call re-reads the
/// working copy or the remote. Mutating operations act on the whole tree.
pub trait Repository: Send + Sync {
    /// Checked-out revision, `None` before the first commit.
    fn local_revision(&self) -> Result<Option<String>>;

    /// Tip of the remote default branch, queried without fetching.
    fn remote_revision(&self) -> Result<Option<String>>;

    /// Divergence probe.
    fn has_remote_changes(&self) -> Result<bool> {
        Ok(self.remote_revision()? != self.local_revision()?)
    }

    /// Deletes every top-level entry except the metadata directory and preserved files.
    fn reset_to_tracked(&self) -> Result<usize>;

    /// Stages everything, then commits and pushes if the tree differs from HEAD.
    fn commit_and_push(&self, message: &str) -> Result<CommitOutcome>;

    /// Fetches and integrates remote changes.
    fn pull(&self) -> Result<PullOutcome>;
}
