//! Remote → mirror tree → consumer tree.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use tracing::info_span;
use walkdir::WalkDir;

use super::run_blocking;
use super::shutdown::Shutdown;
use crate::config::{SyncConfig, SyncRoots};
use crate::error::{FsError, Result};
use crate::sync::convert::PathConverter;
use crate::sync::digest::should_copy;
use crate::sync::file_ops::copy_path;
use crate::sync::scan::{is_vcs_metadata, matching_entries};
use crate::vcs::Repository;

/// Phases of the download loop, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloaderState {
    Sleeping,
    CheckingRemote,
    PullingAndSyncing,
}

/// Counters from one consumer sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub copied: usize,
    pub unchanged: usize,
}

/// Copies changed mirror files into the consumer tree, leaving identical files untouched.
///
/// Directory entries are walked so each file is gated on its own digest.
pub fn sync_consumer(roots: &SyncRoots, patterns: &[String]) -> Result<SyncStats> {
    let _span = info_span!("downloader.sync", from = %roots.from.display()).entered();
    let converter = PathConverter::new(roots.clone());
    let mut stats = SyncStats::default();

    for entry in matching_entries(&roots.from, patterns)? {
        if entry.is_dir() {
            for file in WalkDir::new(&entry).follow_links(true) {
                let file = file.map_err(|e| FsError::Walk {
                    path: entry.clone(),
                    source: e,
                })?;
                if file.file_type().is_dir() || is_vcs_metadata(&roots.from, file.path()) {
                    continue;
                }
                sync_file(&converter, file.path(), &mut stats)?;
            }
        } else {
            sync_file(&converter, &entry, &mut stats)?;
        }
    }

    info!(
        "Consumer sync: {} copied, {} unchanged",
        stats.copied, stats.unchanged
    );
    Ok(stats)
}

fn sync_file(converter: &PathConverter, src: &Path, stats: &mut SyncStats) -> Result<()> {
    let dst = converter.convert(src)?;
    if should_copy(src, &dst)? {
        copy_path(src, &dst)?;
        stats.copied += 1;
    } else {
        debug!("Unchanged: {}", dst.display());
        stats.unchanged += 1;
    }
    Ok(())
}

/// Polls the remote and pulls plus re-syncs whenever it moved.
pub struct Downloader<R> {
    config: SyncConfig,
    repo: Arc<R>,
}

impl<R: Repository + 'static> Downloader<R> {
    pub fn new(config: SyncConfig, repo: R) -> Self {
        Self {
            config,
            repo: Arc::new(repo),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// One probe. Pulls and syncs when the remote diverged; returns the
    /// sync counters in that case.
    pub async fn check_once(&self) -> Result<Option<SyncStats>> {
        transition(DownloaderState::CheckingRemote);
        let repo = Arc::clone(&self.repo);
        if !run_blocking(move || repo.has_remote_changes()).await? {
            return Ok(None);
        }

        transition(DownloaderState::PullingAndSyncing);
        let repo = Arc::clone(&self.repo);
        let roots = SyncRoots::download(&self.config);
        let patterns = self.config.file_patterns.clone();
        let stats = run_blocking(move || {
            let pulled = repo.pull()?;
            if pulled.up_to_date {
                debug!("Pull found nothing new: {}", pulled.message);
            } else {
                info!("Pulled {} changed file(s)", pulled.files_changed);
            }
            sync_consumer(&roots, &patterns)
        })
        .await?;
        Ok(Some(stats))
    }

    /// Runs until `shutdown` fires or a step fails.
    pub async fn run(&self, shutdown: Shutdown) -> Result<()> {
        let interval = self.config.poll_interval();

        while !shutdown.is_triggered() {
            if self.check_once().await?.is_some() {
                // Re-probe straight away; more may have landed meanwhile.
                continue;
            }

            transition(DownloaderState::Sleeping);
            if shutdown.sleep(interval).await {
                break;
            }
        }

        info!("Downloader stopped");
        Ok(())
    }
}

fn transition(state: DownloaderState) {
    debug!("Downloader -> {:?}", state);
}
