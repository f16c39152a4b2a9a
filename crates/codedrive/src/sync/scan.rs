//! Pattern-driven enumeration of the entries to sync under a root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{ConfigError, FsError, Result};

/// Name of the version-control metadata directory, never treated as content.
pub const VCS_METADATA_DIR: &str = ".git";

/// Lists entries under `root` matching any of `patterns`, sorted and deduplicated.
///
/// Patterns are evaluated relative to `root`. Anything inside the git
/// metadata directory is skipped.
pub fn matching_entries(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let mut entries = BTreeSet::new();

    for pattern in patterns {
        let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
        let paths = glob::glob(&full).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        for path in paths {
            let path = path.map_err(|e| FsError::Read {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            if is_vcs_metadata(root, &path) {
                continue;
            }
            entries.insert(path);
        }
    }

    Ok(entries.into_iter().collect())
}

pub fn is_vcs_metadata(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .ok()
        .and_then(|relative| relative.components().next())
        .map(|first| first.as_os_str() == VCS_METADATA_DIR)
        .unwrap_or(false)
}
