//! Recursive notification subscription feeding the [`EventRouter`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;

use super::lock::MirrorLock;
use super::router::{ChangeEvent, EventRouter};
use crate::error::{Result, SyncError};

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// How long a rename origin waits for its destination before it is
/// treated as a plain delete (moved out of the watched tree).
const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(100);

/// Translates one raw notification into router events, without pairing.
///
/// Rename halves become a delete of the old name and a create of the new
/// one; only a paired rename becomes a move. [`RenamePairer`] runs in front
/// of this for backends that split renames.
pub fn translate(event: &Event) -> Vec<ChangeEvent> {
    let each = |make: fn(PathBuf) -> ChangeEvent| -> Vec<ChangeEvent> {
        event.paths.iter().cloned().map(make).collect()
    };

    match &event.kind {
        EventKind::Create(_) => each(ChangeEvent::Created),
        EventKind::Remove(_) => each(ChangeEvent::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![ChangeEvent::Moved {
                from: from.clone(),
                to: to.clone(),
            }],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(ChangeEvent::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(ChangeEvent::Created),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|path| {
                if path.exists() {
                    ChangeEvent::Created(path.clone())
                } else {
                    ChangeEvent::Deleted(path.clone())
                }
            })
            .collect(),
        EventKind::Modify(_) => each(ChangeEvent::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Joins the halves of a split rename into one [`ChangeEvent::Moved`].
///
/// inotify reports a rename as `From`, `To` and then `Both`, all sharing a
/// tracker cookie. The `From` half is held until its partner shows up, the
/// pair is emitted once as a move and the trailing `Both` is swallowed.
/// Origins with no partner inside [`RENAME_PAIR_WINDOW`] fall back to
/// deletes; halves without a tracker go straight through [`translate`].
#[derive(Debug, Default)]
pub struct RenamePairer {
    pending: HashMap<usize, (PathBuf, Instant)>,
    paired: HashSet<usize>,
}

impl RenamePairer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, event: &Event, now: Instant) -> Vec<ChangeEvent> {
        let EventKind::Modify(ModifyKind::Name(mode)) = &event.kind else {
            return translate(event);
        };
        let Some(tracker) = event.tracker() else {
            return translate(event);
        };

        match (mode, event.paths.as_slice()) {
            (RenameMode::From, [from]) => {
                self.pending.insert(tracker, (from.clone(), now));
                Vec::new()
            }
            (RenameMode::To, [to]) => match self.pending.remove(&tracker) {
                Some((from, _)) => {
                    self.paired.insert(tracker);
                    vec![ChangeEvent::Moved {
                        from,
                        to: to.clone(),
                    }]
                }
                None => translate(event),
            },
            (RenameMode::Both, _) => {
                if self.paired.remove(&tracker) {
                    return Vec::new();
                }
                self.pending.remove(&tracker);
                translate(event)
            }
            _ => translate(event),
        }
    }

    /// Releases origins that waited longer than the pairing window as deletes.
    pub fn expire(&mut self, now: Instant) -> Vec<ChangeEvent> {
        let mut expired: Vec<(usize, Instant)> = self
            .pending
            .iter()
            .filter(|(_, (_, since))| {
                now.saturating_duration_since(*since) >= RENAME_PAIR_WINDOW
            })
            .map(|(tracker, (_, since))| (*tracker, *since))
            .collect();
        expired.sort_by_key(|(_, since)| *since);

        expired
            .into_iter()
            .filter_map(|(tracker, _)| self.pending.remove(&tracker))
            .map(|(from, _)| ChangeEvent::Deleted(from))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Running subscription. Stopping joins the delivery thread.
///
/// Dropping the handle stops it too, so no exit path leaves a detached
/// notification consumer behind.
pub struct WatchHandle {
    root: PathBuf,
    shutdown: Arc<AtomicBool>,
    failed: Arc<Notify>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl WatchHandle {
    /// Subscribes to `root` recursively and routes every event on a dedicated thread.
    ///
    /// The subscription is live when this returns; events are queued until
    /// the thread can take `lock`.
    pub fn spawn(root: &Path, router: EventRouter, lock: MirrorLock) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|e| SyncError::Watch(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| SyncError::Watch(format!("{}: {}", root.display(), e)))?;

        log::info!("Watching {} for changes", root.display());

        let shutdown = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(Notify::new());
        let thread = {
            let shutdown = Arc::clone(&shutdown);
            let failed = Arc::clone(&failed);
            std::thread::Builder::new()
                .name("codedrive-router".into())
                .spawn(move || {
                    // Owning the watcher here ties the subscription to this thread.
                    let _watcher = watcher;
                    let result = route_events(&rx, &router, &lock, &shutdown);
                    if result.is_err() {
                        failed.notify_one();
                    }
                    result
                })
                .map_err(|e| SyncError::Watch(e.to_string()))?
        };

        Ok(Self {
            root: root.to_path_buf(),
            shutdown,
            failed,
            thread: Some(thread),
        })
    }

    /// Resolves once the routing thread has stopped on an error.
    pub async fn failed(&self) {
        self.failed.notified().await;
    }

    /// Stops the subscription, joins the thread and returns its result.
    pub fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let result = thread
            .join()
            .map_err(|_| SyncError::Task("event router thread panicked".to_string()))?;
        log::info!("Stopped watching {}", self.root.display());
        result
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Watcher for {} ended with error: {}", self.root.display(), e);
        }
    }
}

fn route_events(
    rx: &mpsc::Receiver<notify::Result<Event>>,
    router: &EventRouter,
    lock: &MirrorLock,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut pairer = RenamePairer::new();

    loop {
        if shutdown.load(Ordering::Acquire) {
            return Ok(());
        }

        match rx.recv_timeout(POLL_TIMEOUT) {
            Ok(Ok(event)) => apply(router, lock, pairer.accept(&event, Instant::now()))?,
            Ok(Err(e)) => {
                log::warn!("Watch error: {}", e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SyncError::Watch(
                    "notification channel disconnected".to_string(),
                ));
            }
        }

        if pairer.has_pending() {
            apply(router, lock, pairer.expire(Instant::now()))?;
        }
    }
}

fn apply(router: &EventRouter, lock: &MirrorLock, changes: Vec<ChangeEvent>) -> Result<()> {
    for change in changes {
        let _guard = lock.acquire();
        if let Err(e) = router.handle(&change) {
            log::error!("Failed to mirror {:?}: {}", change, e);
            return Err(e);
        }
    }
    Ok(())
}
