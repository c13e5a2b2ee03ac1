//! Identity and disposal primitives for the reactive system.
//!
//! Every observable cell, live watcher, and registered listener carries a
//! unique ID generated from an atomic counter. IDs are how the notify queue
//! records which watcher depends on which observable without holding
//! references to either.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an observable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservableId(u64);

impl ObservableId {
    /// Generate a new unique observable ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObservableId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a live watcher (one reaction bound to one instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Generate a new unique watcher ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a registered listener callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle for exactly one subscription.
///
/// The underlying cancellation action runs at most once: either through an
/// explicit [`Disposer::dispose`] call or when the handle is dropped.
/// Because `dispose` consumes the handle, a second invocation is impossible
/// by construction.
pub struct Disposer {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    /// Create a disposer that runs `action` when invoked or dropped.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// A disposer with nothing to cancel.
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Cancel the subscription now instead of waiting for drop.
    pub fn dispose(mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("armed", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn ids_are_unique() {
        let a = ObservableId::new();
        let b = ObservableId::new();
        let c = ObservableId::new();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn disposer_runs_action_once() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let disposer = Disposer::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        disposer.dispose();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposer_runs_action_on_drop() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        {
            let _disposer = Disposer::new(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_disposer_is_safe() {
        let disposer = Disposer::noop();
        disposer.dispose();

        let _also_safe = Disposer::noop();
    }
}
