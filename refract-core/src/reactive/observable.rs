//! Observable Implementation
//!
//! An Observable is the fundamental reactive cell. It holds a value, reports
//! reads to the active tracking scope, and publishes changes to its bound
//! notify queues and direct subscribers.
//!
//! # How Observables Work
//!
//! 1. When an observable is read inside a tracking scope (a watcher's
//!    selector), the read is recorded so the watcher's dependency set can be
//!    rebuilt from it.
//!
//! 2. Writing a value equal to the current one is a no-op: no version bump,
//!    no queue mark, no subscriber call.
//!
//! 3. A real change bumps the version counter exactly once, marks every
//!    bound queue, and then calls direct subscribers in registration order.
//!
//! # Thread Safety
//!
//! The value is protected by a lock, and all callbacks run after the value
//! lock has been released. Subscriber callbacks run outside the subscriber
//! registry lock as well, so a callback may subscribe or dispose without
//! deadlocking.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::TrackingScope;
use super::queue::NotifyQueue;
use super::subscription::{Disposer, ListenerId, ObservableId};

type ListenerFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A reactive cell holding a value of type T.
///
/// # Type Parameters
///
/// - `T`: The stored value type. The `PartialEq` bound is what lets a write
///   of an equal value be suppressed instead of waking dependents.
///
/// # Example
///
/// ```rust,ignore
/// let cell = Observable::new(0);
///
/// let seen = cell.subscribe(|value| println!("now {value}"));
///
/// cell.set(5);   // subscriber runs
/// cell.set(5);   // no change, nothing runs
/// ```
pub struct Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Unique identifier for this cell.
    id: ObservableId,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Mutation counter. Bumped exactly once per accepted write.
    version: Arc<AtomicU64>,

    /// Direct subscribers, called synchronously after an accepted write.
    subscribers: Arc<RwLock<Vec<(ListenerId, ListenerFn<T>)>>>,

    /// Notify queues this cell reports changes into.
    queues: Arc<RwLock<SmallVec<[NotifyQueue; 1]>>>,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new observable with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: ObservableId::new(),
            value: Arc::new(RwLock::new(value)),
            version: Arc::new(AtomicU64::new(0)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            queues: Arc::new(RwLock::new(SmallVec::new())),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> ObservableId {
        self.id
    }

    /// Bind this cell to a notify queue.
    ///
    /// Accepted writes mark the queue so watchers depending on this cell are
    /// scheduled. Binding the same queue twice has no effect.
    pub fn bind_queue(&self, queue: &NotifyQueue) {
        let mut queues = self.queues.write();
        if queues.iter().any(|bound| bound.same_queue(queue)) {
            return;
        }
        queues.push(queue.clone());
    }

    /// Get the current value.
    ///
    /// If called within a tracking scope, the read is recorded as a
    /// dependency of the running watcher.
    pub fn get(&self) -> T {
        if TrackingScope::is_active() {
            TrackingScope::track_read(self.id);
        }
        self.value.read().clone()
    }

    /// Get the current value without recording a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Read the current value through a closure, without cloning it.
    ///
    /// Records a dependency like [`Observable::get`] when a tracking scope
    /// is active.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if TrackingScope::is_active() {
            TrackingScope::track_read(self.id);
        }
        let guard = self.value.read();
        f(&guard)
    }

    /// Set a new value.
    ///
    /// If the new value equals the current one, nothing happens. Otherwise
    /// the version is bumped, bound queues are marked, and direct
    /// subscribers run in registration order with the new value.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            if *guard == value {
                return;
            }
            *guard = value.clone();
        }

        self.version.fetch_add(1, Ordering::Relaxed);

        let queues: SmallVec<[NotifyQueue; 1]> = self.queues.read().clone();
        for queue in &queues {
            queue.mark_changed(self.id);
        }

        // Collect first so callbacks run without the registry lock held.
        let listeners: Vec<ListenerFn<T>> = {
            let subscribers = self.subscribers.read();
            subscribers
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in listeners {
            listener(&value);
        }
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(next);
    }

    /// Register a subscriber called synchronously after each accepted write.
    ///
    /// The returned [`Disposer`] cancels the subscription when invoked or
    /// dropped.
    pub fn subscribe<F>(&self, listener: F) -> Disposer
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.subscribers.write().push((id, Arc::new(listener)));

        let subscribers: Weak<RwLock<Vec<(ListenerId, ListenerFn<T>)>>> =
            Arc::downgrade(&self.subscribers);
        Disposer::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.write().retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Mutation count since creation.
    ///
    /// Stable across writes of equal values, so it can be used to observe
    /// whether a cell was really republished.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Get the number of direct subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl<T> Clone for Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            version: Arc::clone(&self.version),
            subscribers: Arc::clone(&self.subscribers),
            queues: Arc::clone(&self.queues),
        }
    }
}

impl<T> Debug for Observable<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("version", &self.version())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::subscription::WatcherId;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn observable_get_and_set() {
        let cell = Observable::new(0);
        assert_eq!(cell.get(), 0);

        cell.set(42);
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn observable_update() {
        let cell = Observable::new(10);
        cell.update(|v| v + 5);
        assert_eq!(cell.get(), 15);
    }

    #[test]
    fn set_equal_value_is_a_no_op() {
        let cell = Observable::new(7);
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let _sub = cell.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(7);
        assert_eq!(cell.version(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        cell.set(8);
        assert_eq!(cell.version(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cell.set(8);
        assert_eq!(cell.version(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let cell = Observable::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _first = cell.subscribe(move |_| order_a.lock().push("first"));
        let order_b = order.clone();
        let _second = cell.subscribe(move |_| order_b.lock().push("second"));

        cell.set(1);
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn subscriber_receives_the_new_value() {
        let cell = Observable::new(String::new());
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_clone = seen.clone();

        let _sub = cell.subscribe(move |value: &String| {
            *seen_clone.lock() = value.clone();
        });

        cell.set("hello".to_string());
        assert_eq!(*seen.lock(), "hello");
    }

    #[test]
    fn disposer_cancels_subscription() {
        let cell = Observable::new(0);
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let sub = cell.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.subscriber_count(), 1);

        sub.dispose();
        assert_eq!(cell.subscriber_count(), 0);

        cell.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_disposer_cancels_the_subscription() {
        let cell = Observable::new(0);

        {
            let _sub = cell.subscribe(|_| {});
            assert_eq!(cell.subscriber_count(), 1);
        }

        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn tracked_reads_record_into_the_active_scope() {
        let cell = Observable::new(1);
        let watcher = WatcherId::new();

        let reads = {
            let _scope = TrackingScope::enter(watcher);
            cell.get();
            cell.with(|v| *v);
            TrackingScope::collected_reads()
        };

        assert_eq!(reads, vec![cell.id(), cell.id()]);

        // Untracked reads never record
        let reads = {
            let _scope = TrackingScope::enter(watcher);
            cell.get_untracked();
            TrackingScope::collected_reads()
        };
        assert!(reads.is_empty());
    }

    #[test]
    fn accepted_writes_mark_bound_queues() {
        let cell = Observable::new(0);
        let queue = NotifyQueue::new();
        let watcher = WatcherId::new();

        cell.bind_queue(&queue);
        cell.bind_queue(&queue); // second bind has no effect
        queue.watch(watcher, &[cell.id()]);

        cell.set(0); // not a change
        assert!(!queue.has_pending());

        cell.set(1);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn observable_clone_shares_state() {
        let cell1 = Observable::new(0);
        let cell2 = cell1.clone();

        cell1.set(42);
        assert_eq!(cell2.get(), 42);
        assert_eq!(cell2.version(), 1);

        cell2.set(100);
        assert_eq!(cell1.get(), 100);
    }
}
