//! Outcomes of git operations.

/// Result of a periodic commit+push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was created and pushed.
    Committed { revision: String },
    /// Nothing was staged, but earlier local commits were pushed.
    PushedPending { commits: u32 },
    /// Working tree matched HEAD; neither commit nor push happened.
    NothingToCommit,
}

impl CommitOutcome {
    pub fn pushed(&self) -> bool {
        !matches!(self, CommitOutcome::NothingToCommit)
    }
}

/// Result of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// Pull reported "Already up to date".
    pub up_to_date: bool,
    /// Number of files git reported as changed.
    pub files_changed: u32,
    pub message: String,
}
