//! Parsers for the plumbing output `GitRepository` reads back.

use std::process::Output;

/// Human-readable reason for a failed git invocation: stderr, then stdout,
/// or the exit code when both are empty.
pub fn failure_message(output: &Output) -> String {
    let streams: Vec<String> = [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if streams.is_empty() {
        match output.status.code() {
            Some(code) => format!("git exited with status {}", code),
            None => "git was terminated by a signal".to_string(),
        }
    } else {
        streams.join("\n")
    }
}

/// Object id advertised for `HEAD` in `git ls-remote <url> HEAD` output.
/// An empty remote advertises nothing.
pub fn ls_remote_head(listing: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let (id, reference) = line.split_once('\t')?;
        (reference.trim() == "HEAD" && !id.is_empty()).then(|| id.to_string())
    })
}

/// Ahead/behind counters of the checked-out branch against its upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchTracking {
    pub ahead: u32,
    pub behind: u32,
}

/// Reads the `## branch...upstream [ahead N, behind M]` header of
/// `git status --porcelain -b`. `None` when the branch has no divergence info.
pub fn branch_tracking(header: &str) -> Option<BranchTracking> {
    let (_, rest) = header.split_once('[')?;
    let (counters, _) = rest.split_once(']')?;

    let mut tracking = BranchTracking::default();
    for counter in counters.split(',') {
        match counter.trim().split_once(' ') {
            Some(("ahead", n)) => tracking.ahead = n.parse().unwrap_or(0),
            Some(("behind", n)) => tracking.behind = n.parse().unwrap_or(0),
            _ => {}
        }
    }
    Some(tracking)
}

/// File count from the diffstat summary a merging pull prints
/// (` 3 files changed, 10 insertions(+)`).
pub fn diffstat_files(pull_stdout: &str) -> u32 {
    pull_stdout
        .lines()
        .find(|line| line.contains(" changed"))
        .and_then(|line| line.split_whitespace().next())
        .and_then(|count| count.parse().ok())
        .unwrap_or(0)
}
