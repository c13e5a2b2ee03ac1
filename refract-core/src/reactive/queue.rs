//! Notification Queue
//!
//! The notify queue connects observables to the watchers that depend on them.
//! It is owned per component instance: changes made by one instance never mark
//! work for another.
//!
//! # How It Works
//!
//! 1. After a watcher's selector runs, the watcher's collected reads are
//!    stored with [`NotifyQueue::watch`]. Old interest edges are replaced,
//!    not accumulated.
//!
//! 2. When an observable bound to this queue changes, every interested
//!    watcher is marked pending.
//!
//! 3. A flush takes the pending set with [`NotifyQueue::take_pending`] and
//!    re-evaluates the marked watchers. Marks added while the flush runs are
//!    picked up by the next take.
//!
//! Pending marks deduplicate: a watcher whose dependencies changed three
//! times before the flush still runs once per pass.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::subscription::{ObservableId, WatcherId};

/// Per-instance notification queue.
///
/// Clones share the same underlying queue.
#[derive(Clone, Default)]
pub struct NotifyQueue {
    inner: Arc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    /// Observable ID to the watchers interested in it.
    interests: RwLock<HashMap<ObservableId, SmallVec<[WatcherId; 2]>>>,

    /// Watcher ID to its current dependency set.
    deps: RwLock<HashMap<WatcherId, SmallVec<[ObservableId; 4]>>>,

    /// Watchers marked for re-evaluation, in mark order.
    pending: Mutex<IndexSet<WatcherId>>,
}

impl NotifyQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether two handles point at the same queue.
    pub fn same_queue(&self, other: &NotifyQueue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Replace the watcher's dependency set with `reads`.
    ///
    /// Duplicate reads collapse to a single edge. Interest edges from the
    /// watcher's previous evaluation are removed first.
    pub fn watch(&self, watcher: WatcherId, reads: &[ObservableId]) {
        let mut deps: SmallVec<[ObservableId; 4]> = SmallVec::new();
        for &id in reads {
            if !deps.contains(&id) {
                deps.push(id);
            }
        }

        let mut interests = self.inner.interests.write();
        let mut dep_map = self.inner.deps.write();

        if let Some(old) = dep_map.get(&watcher) {
            for id in old {
                if let Some(list) = interests.get_mut(id) {
                    list.retain(|w| *w != watcher);
                    if list.is_empty() {
                        interests.remove(id);
                    }
                }
            }
        }

        for &id in &deps {
            interests.entry(id).or_default().push(watcher);
        }
        dep_map.insert(watcher, deps);
    }

    /// Remove all records for the watcher, including any pending mark.
    ///
    /// Safe to call for a watcher the queue has never seen.
    pub fn unwatch(&self, watcher: WatcherId) {
        {
            let mut interests = self.inner.interests.write();
            let mut dep_map = self.inner.deps.write();

            if let Some(old) = dep_map.remove(&watcher) {
                for id in old {
                    if let Some(list) = interests.get_mut(&id) {
                        list.retain(|w| *w != watcher);
                        if list.is_empty() {
                            interests.remove(&id);
                        }
                    }
                }
            }
        }

        self.inner.pending.lock().shift_remove(&watcher);
    }

    /// Mark every watcher interested in `observable` as pending.
    pub fn mark_changed(&self, observable: ObservableId) {
        let interested: SmallVec<[WatcherId; 2]> = {
            let interests = self.inner.interests.read();
            interests.get(&observable).cloned().unwrap_or_default()
        };

        if interested.is_empty() {
            return;
        }

        let mut pending = self.inner.pending.lock();
        for watcher in interested {
            pending.insert(watcher);
        }
    }

    /// Take the current pending set, leaving the queue empty.
    pub fn take_pending(&self) -> IndexSet<WatcherId> {
        mem::take(&mut *self.inner.pending.lock())
    }

    /// Check whether any watcher is marked pending.
    pub fn has_pending(&self) -> bool {
        !self.inner.pending.lock().is_empty()
    }

    /// Number of watchers currently marked pending.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Number of watchers with recorded dependencies.
    pub fn watched_count(&self) -> usize {
        self.inner.deps.read().len()
    }
}

impl std::fmt::Debug for NotifyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyQueue")
            .field("watched_count", &self.watched_count())
            .field("pending_count", &self.pending_count())
            .finish()
    }
}
