//! Source tree → mirror tree → remote.

use std::sync::Arc;

use log::{error, info, warn};
use tracing::info_span;

use super::shutdown::Shutdown;
use super::run_blocking;
use crate::config::{SyncConfig, SyncRoots};
use crate::error::Result;
use crate::sync::convert::PathConverter;
use crate::sync::file_ops::copy_path;
use crate::sync::scan::matching_entries;
use crate::sync::{EventRouter, MirrorLock, PathMatcher, WatchHandle};
use crate::vcs::{CommitOutcome, Repository};

/// Phases of the upload loop, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploaderState {
    Initializing,
    Watching,
    Idle,
    Pushing,
}

/// Keeps the mirror tree in step with the source tree and pushes it periodically.
pub struct Uploader<R> {
    config: SyncConfig,
    repo: Arc<R>,
    lock: MirrorLock,
}

impl<R: Repository + 'static> Uploader<R> {
    pub fn new(config: SyncConfig, repo: R) -> Self {
        Self {
            config,
            repo: Arc::new(repo),
            lock: MirrorLock::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Empties the mirror and copies every matching source entry into it.
    ///
    /// Callers must hold the mirror lock (or be the only writer).
    pub fn initialize(&self) -> Result<usize> {
        baseline(&self.config, self.repo.as_ref())
    }

    /// Runs until `shutdown` fires or a step fails.
    ///
    /// The watch subscription is always stopped and joined before returning.
    /// Startup and the final join run on the blocking pool.
    pub async fn run(&self, shutdown: Shutdown) -> Result<()> {
        let config = self.config.clone();
        let repo = Arc::clone(&self.repo);
        let lock = self.lock.clone();
        let watch = run_blocking(move || start(&config, repo.as_ref(), &lock)).await?;
        transition(UploaderState::Watching);

        let result = self.push_loop(&shutdown, &watch).await;
        let stopped = run_blocking(move || {
            let mut watch = watch;
            watch.stop()
        })
        .await;

        match (result, stopped) {
            (Err(e), Err(watch_err)) => {
                error!("Watcher also failed: {}", watch_err);
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => {
                info!("Uploader stopped");
                Ok(())
            }
        }
    }

    async fn push_loop(&self, shutdown: &Shutdown, watch: &WatchHandle) -> Result<()> {
        let interval = self.config.poll_interval();

        loop {
            transition(UploaderState::Idle);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.wait() => return Ok(()),
                // The router's error surfaces when the caller joins the watcher.
                _ = watch.failed() => return Ok(()),
            }

            transition(UploaderState::Pushing);
            let repo = Arc::clone(&self.repo);
            let lock = self.lock.clone();
            let message = self.config.commit_message.clone();
            let outcome = run_blocking(move || {
                let _guard = lock.acquire();
                repo.commit_and_push(&message)
            })
            .await?;

            match outcome {
                CommitOutcome::Committed { revision } => info!("Pushed {}", revision),
                CommitOutcome::PushedPending { commits } => {
                    info!("Pushed {} pending commit(s)", commits)
                }
                CommitOutcome::NothingToCommit => {}
            }
        }
    }
}

fn baseline<R: Repository>(config: &SyncConfig, repo: &R) -> Result<usize> {
    let _span = info_span!("uploader.initialize").entered();
    transition(UploaderState::Initializing);

    repo.reset_to_tracked()?;

    let roots = SyncRoots::upload(config);
    let converter = PathConverter::new(roots.clone());
    let entries = matching_entries(&roots.from, &config.file_patterns)?;
    for entry in &entries {
        copy_path(entry, &converter.convert(entry)?)?;
    }

    info!(
        "Baseline copy: {} entries from {} into {}",
        entries.len(),
        roots.from.display(),
        roots.to.display()
    );
    Ok(entries.len())
}

/// Subscribes to the source tree, then runs the baseline copy.
///
/// Both happen under the mirror lock, so events raised during the
/// baseline queue up behind it instead of being lost or interleaved.
fn start<R: Repository>(config: &SyncConfig, repo: &R, lock: &MirrorLock) -> Result<WatchHandle> {
    let matcher = PathMatcher::new(&config.file_patterns)?;
    let router = EventRouter::new(matcher, SyncRoots::upload(config));

    let guard = lock.acquire();
    let mut watch = WatchHandle::spawn(&config.path_in, router, lock.clone())?;
    let copied = baseline(config, repo);
    drop(guard);

    match copied {
        Ok(_) => Ok(watch),
        Err(e) => {
            if let Err(watch_err) = watch.stop() {
                warn!("Watcher stopped with error: {}", watch_err);
            }
            Err(e)
        }
    }
}

fn transition(state: UploaderState) {
    log::debug!("Uploader -> {:?}", state);
}
