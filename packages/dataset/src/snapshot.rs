//! Atomic snapshot swapping for reloads.
//!
//! Readers clone the current [`Arc`] and keep working on it; a reload
//! builds a complete new value off to the side and swaps the pointer.
//! A reader therefore sees either the old or the new snapshot, never a
//! mix of both.

use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the current snapshot of `T`.
#[derive(Debug)]
pub struct SnapshotHandle<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotHandle<T> {
    /// Wraps an initial snapshot.
    pub fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The snapshot readers should use right now.
    ///
    /// The lock only guards a pointer assignment, so a poisoned lock still
    /// holds a complete snapshot and is read through.
    #[must_use]
    pub fn current(&self) -> Arc<T> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publishes a new snapshot and returns the one it replaced.
    pub fn replace(&self, next: T) -> Arc<T> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
