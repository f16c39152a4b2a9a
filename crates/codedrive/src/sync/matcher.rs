//! Glob-set membership for synced paths.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::ConfigError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: !cfg!(windows),
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One configured pattern, split into per-component globs.
#[derive(Debug, Clone)]
struct CompiledPattern {
    raw: String,
    absolute: bool,
    segments: Vec<Pattern>,
}

impl CompiledPattern {
    fn compile(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let normalized = raw.replace('\\', "/");
        let absolute = normalized.starts_with('/');
        let segments = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| Pattern::new(s).map_err(|e| invalid(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Err(invalid("pattern has no path components".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            absolute,
            segments,
        })
    }

    /// Relative patterns anchor at the end of the path, absolute ones at both ends.
    fn matches(&self, components: &[String]) -> bool {
        if self.absolute && components.len() != self.segments.len() {
            return false;
        }
        if components.len() < self.segments.len() {
            return false;
        }

        let tail = &components[components.len() - self.segments.len()..];
        self.segments
            .iter()
            .zip(tail)
            .all(|(pattern, component)| pattern.matches_with(component, MATCH_OPTIONS))
    }
}

/// Decides whether a path belongs to the synced set.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PathMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| CompiledPattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True iff the resolved path satisfies at least one pattern.
    pub fn matches(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let resolved = resolve_lenient(path);
        let components: Vec<String> = resolved
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        match self.patterns.iter().find(|p| p.matches(&components)) {
            Some(pattern) => {
                log::trace!("{} matched by '{}'", path.display(), pattern.raw);
                true
            }
            None => false,
        }
    }
}

/// Resolves symlinks and relative segments without requiring the path to exist.
///
/// The longest existing ancestor is canonicalized and the missing tail is
/// appended as-is, so events for already deleted files still resolve.
pub fn resolve_lenient(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut canonical) = dunce::canonicalize(existing) {
            for part in missing.iter().rev() {
                canonical.push(part);
            }
            return canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
