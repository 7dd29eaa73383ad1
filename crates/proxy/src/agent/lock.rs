//! Process-wide guard around the apply pipeline.
//!
//! A second apply does not queue behind the first: [`DeployLock::try_acquire`]
//! fails immediately and the caller answers `409`. The guard releases the
//! lock on drop, so a failed or panicking pipeline never leaves it held.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct DeployLock {
    inner: Arc<Mutex<()>>,
}

/// Proof that the holder owns the deploy slot.
#[derive(Debug)]
pub struct DeployGuard {
    _guard: OwnedMutexGuard<()>,
}

impl DeployLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or `None` when an apply is already running.
    pub fn try_acquire(&self) -> Option<DeployGuard> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .ok()
            .map(|guard| DeployGuard { _guard: guard })
    }

    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let lock = DeployLock::new();
        let guard = lock.try_acquire().expect("first acquire");
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());
        drop(guard);
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_slot() {
        let lock = DeployLock::new();
        let other = lock.clone();
        let _guard = lock.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[tokio::test]
    async fn released_when_holder_panics() {
        let lock = DeployLock::new();
        let guard = lock.try_acquire().unwrap();
        let handle = tokio::spawn(async move {
            let _held = guard;
            panic!("pipeline blew up");
        });
        assert!(handle.await.is_err());
        assert!(!lock.is_held());
    }
}
