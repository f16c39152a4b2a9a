use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Serializes every mutation of the mirror tree and its git working copy.
///
/// The event router, the baseline copy and the periodic commit+push all take
/// this lock, so a push never observes a half-applied directory copy.
#[derive(Debug, Clone, Default)]
pub struct MirrorLock(Arc<Mutex<()>>);

impl MirrorLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, a panicked holder leaves nothing inconsistent.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_one_lock() {
        let lock = MirrorLock::new();
        let other = lock.clone();

        let guard = lock.acquire();
        assert!(other.0.try_lock().is_err());
        drop(guard);
        assert!(other.0.try_lock().is_ok());
    }

    #[test]
    fn test_poisoned_lock_still_acquirable() {
        let lock = MirrorLock::new();
        let poisoner = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.acquire();
            panic!("poison");
        })
        .join();

        let _guard = lock.acquire();
    }
}
