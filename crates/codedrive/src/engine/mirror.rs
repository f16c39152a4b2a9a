//! Plain one-way mirroring of the source tree, without version control.

use log::{info, warn};
use tracing::info_span;

use super::run_blocking;
use super::shutdown::Shutdown;
use crate::config::{SyncConfig, SyncRoots};
use crate::error::Result;
use crate::sync::convert::PathConverter;
use crate::sync::file_ops::copy_path;
use crate::sync::scan::matching_entries;
use crate::sync::{EventRouter, MirrorLock, PathMatcher, WatchHandle};

/// Copies matching entries from `path_in` to `path_out` without clearing the target first.
pub fn copy_baseline(config: &SyncConfig) -> Result<usize> {
    let _span = info_span!("mirror.baseline").entered();
    let roots = SyncRoots::upload(config);
    let converter = PathConverter::new(roots.clone());

    let entries = matching_entries(&roots.from, &config.file_patterns)?;
    for entry in &entries {
        copy_path(entry, &converter.convert(entry)?)?;
    }
    Ok(entries.len())
}

/// Watches `path_in` and replays every matching change into `path_out`
/// until `shutdown` fires or the watcher fails.
pub async fn run_mirror(config: &SyncConfig, shutdown: Shutdown) -> Result<()> {
    let owned = config.clone();
    let watch = run_blocking(move || start(&owned)).await?;

    tokio::select! {
        _ = shutdown.wait() => {}
        _ = watch.failed() => {}
    }

    run_blocking(move || {
        let mut watch = watch;
        watch.stop()
    })
    .await?;
    info!("Mirror stopped");
    Ok(())
}

fn start(config: &SyncConfig) -> Result<WatchHandle> {
    let lock = MirrorLock::new();
    let matcher = PathMatcher::new(&config.file_patterns)?;
    let router = EventRouter::new(matcher, SyncRoots::upload(config));

    let guard = lock.acquire();
    let mut watch = WatchHandle::spawn(&config.path_in, router, lock.clone())?;
    match copy_baseline(config) {
        Ok(count) => {
            info!("Mirrored {} entries", count);
            Ok(watch)
        }
        Err(e) => {
            drop(guard);
            if let Err(watch_err) = watch.stop() {
                warn!("Watcher stopped with error: {}", watch_err);
            }
            Err(e)
        }
    }
}
