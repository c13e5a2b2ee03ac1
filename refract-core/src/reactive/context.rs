//! Dependency Tracking Scope
//!
//! The tracking scope records which watcher is currently evaluating its
//! selector. This enables automatic dependency collection: when an observable
//! is read, it reports the read into the active scope, and the watcher's
//! dependency set is rebuilt from what was actually touched.
//!
//! # Implementation
//!
//! We use a thread-local stack of tracking frames. Entering a scope pushes a
//! frame for the watcher; reads push observable IDs into the top frame; the
//! frame is popped when the guard drops. The stack shape supports nested
//! evaluations (a selector that calls into another derived read).

use std::cell::RefCell;

use super::subscription::{ObservableId, WatcherId};

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeFrame>> = RefCell::new(Vec::new());
}

/// A frame on the tracking stack.
#[derive(Debug, Clone)]
struct ScopeFrame {
    /// The watcher whose selector is currently running.
    watcher: WatcherId,
    /// Observable IDs read during this evaluation, in read order.
    reads: Vec<ObservableId>,
}

/// Guard that pops the tracking frame when dropped.
///
/// Keeps the stack balanced even if the selector panics.
pub struct TrackingScope {
    watcher: WatcherId,
}

impl TrackingScope {
    /// Enter a tracking scope for the given watcher.
    ///
    /// While the scope is active, observable reads on this thread are
    /// recorded against the watcher. The scope exits when the returned
    /// guard is dropped.
    pub fn enter(watcher: WatcherId) -> Self {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeFrame {
                watcher,
                reads: Vec::new(),
            });
        });

        Self { watcher }
    }

    /// Check whether a tracking scope is active on this thread.
    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the watcher whose scope is innermost, if any.
    pub fn current_watcher() -> Option<WatcherId> {
        SCOPE_STACK.with(|stack| stack.borrow().last().map(|frame| frame.watcher))
    }

    /// Record a read of the given observable.
    ///
    /// Called by observables when they are read.
    pub fn track_read(observable: ObservableId) {
        SCOPE_STACK.with(|stack| {
            if let Some(frame) = stack.borrow_mut().last_mut() {
                frame.reads.push(observable);
            }
        });
    }

    /// Get the reads collected in the innermost scope.
    pub fn collected_reads() -> Vec<ObservableId> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|frame| frame.reads.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for TrackingScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched enter/exit pairs during development.
            if let Some(frame) = popped {
                debug_assert_eq!(
                    frame.watcher, self.watcher,
                    "TrackingScope mismatch: expected {:?}, got {:?}",
                    self.watcher, frame.watcher
                );
            }
        });
    }
}
