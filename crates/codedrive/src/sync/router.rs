//! Replays source-tree change events onto the mirror tree.

use std::path::{Path, PathBuf};

use log::{debug, info};

use super::convert::PathConverter;
use super::file_ops::{copy_path, delete_path};
use super::matcher::PathMatcher;
use super::scan::is_vcs_metadata;
use crate::config::SyncRoots;
use crate::error::Result;

/// A single filesystem change reported for the watched tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// Path the matcher is tested against. For moves this is the origin.
    pub fn source_path(&self) -> &Path {
        match self {
            ChangeEvent::Created(path)
            | ChangeEvent::Modified(path)
            | ChangeEvent::Deleted(path) => path,
            ChangeEvent::Moved { from, .. } => from,
        }
    }

    /// Every path the event touches.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        let (first, second) = match self {
            ChangeEvent::Created(path)
            | ChangeEvent::Modified(path)
            | ChangeEvent::Deleted(path) => (path.as_path(), None),
            ChangeEvent::Moved { from, to } => (from.as_path(), Some(to.as_path())),
        };
        std::iter::once(first).chain(second)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Created(_) => "created",
            ChangeEvent::Modified(_) => "modified",
            ChangeEvent::Deleted(_) => "deleted",
            ChangeEvent::Moved { .. } => "moved",
        }
    }
}

/// What the router did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied,
    Filtered,
}

/// Filters events through the matcher and mirrors the change.
#[derive(Debug, Clone)]
pub struct EventRouter {
    matcher: PathMatcher,
    converter: PathConverter,
}

impl EventRouter {
    pub fn new(matcher: PathMatcher, roots: SyncRoots) -> Self {
        Self {
            matcher,
            converter: PathConverter::new(roots),
        }
    }

    /// Applies one event synchronously.
    ///
    /// Moves copy the mirrored origin to its new place before deleting it,
    /// so an interruption in between leaves two copies rather than none.
    pub fn handle(&self, event: &ChangeEvent) -> Result<RouteOutcome> {
        let from_root = self.converter.roots().from_root();
        if event.paths().any(|path| is_vcs_metadata(from_root, path)) {
            debug!(
                "Ignoring {} event inside git metadata: {}",
                event.kind(),
                event.source_path().display()
            );
            return Ok(RouteOutcome::Filtered);
        }

        if !self.matcher.matches(event.source_path()) {
            // A rename into the synced set mirrors like a fresh file.
            if let ChangeEvent::Moved { to, .. } = event {
                if self.matcher.matches(to) {
                    return self.handle(&ChangeEvent::Created(to.clone()));
                }
            }
            debug!(
                "Ignoring {} event for unmatched path {}",
                event.kind(),
                event.source_path().display()
            );
            return Ok(RouteOutcome::Filtered);
        }

        match event {
            ChangeEvent::Created(path) | ChangeEvent::Modified(path) => {
                let mirrored = self.converter.convert(path)?;
                copy_path(path, &mirrored)?;
            }
            ChangeEvent::Deleted(path) => {
                let mirrored = self.converter.convert(path)?;
                delete_path(&mirrored)?;
            }
            ChangeEvent::Moved { from, to } => {
                let mirrored_from = self.converter.convert(from)?;
                let mirrored_to = self.converter.convert(to)?;
                if mirrored_from.exists() {
                    copy_path(&mirrored_from, &mirrored_to)?;
                } else {
                    // Renamed before its creation was mirrored.
                    copy_path(to, &mirrored_to)?;
                }
                delete_path(&mirrored_from)?;
            }
        }

        info!(
            "Mirrored {} event: {}",
            event.kind(),
            event.source_path().display()
        );
        Ok(RouteOutcome::Applied)
    }
}
