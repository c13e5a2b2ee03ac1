//! Reactor Implementation
//!
//! The reactor binds a class's reaction declarations to one component
//! instance. It owns the live watchers: activation creates one watcher per
//! declaration, a flush re-evaluates the watchers the notify queue marked,
//! and deactivation disposes everything synchronously.
//!
//! # Update Cycle
//!
//! 1. [`Reactor::activate`] runs each selector once under dependency
//!    tracking to establish its dependency set and baseline output. Effects
//!    do not run at activation.
//!
//! 2. Observable writes mark interested watchers pending on the queue.
//!
//! 3. [`Reactor::flush`] drains the pending set. A marked watcher re-runs
//!    its selector (replacing its dependency set) and runs its effect only
//!    when the selector output changed, receiving the new and previous
//!    outputs. Within a pass, watchers run in subscription order. Marks
//!    added by effects are handled in follow-up passes until the queue
//!    settles.
//!
//! 4. [`Reactor::deactivate`] removes every watcher, its dependency
//!    records, and any pending marks. After it returns, no effect from
//!    this instance will run.
//!
//! A pass cap bounds runaway effect loops: if the queue has not settled
//! after [`MAX_FLUSH_PASSES`] passes, the flush warns and returns with the
//! remaining marks left queued.
//!
//! # Locking
//!
//! The watcher table lock is never held while a selector or effect runs,
//! so effects are free to write observables, flush, or deactivate.

use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::context::TrackingScope;
use super::queue::NotifyQueue;
use super::reaction::ReactionSet;
use super::subscription::WatcherId;

/// Upper bound on flush passes before bailing out of a non-settling loop.
pub const MAX_FLUSH_PASSES: usize = 100;

/// Live state for one watcher.
struct WatcherState {
    /// Index of the declaration in the reaction set.
    reaction: usize,

    /// Selector output from the most recent evaluation.
    last: Value,
}

/// Binds reaction declarations to one component instance.
///
/// Clones share the same watcher table and queue.
pub struct Reactor<C> {
    set: ReactionSet<C>,
    queue: NotifyQueue,
    watchers: Arc<RwLock<IndexMap<WatcherId, WatcherState>>>,
}

impl<C> Reactor<C> {
    /// Create a reactor over the given declarations and queue.
    pub fn new(set: ReactionSet<C>, queue: NotifyQueue) -> Self {
        Self {
            set,
            queue,
            watchers: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// The queue this reactor drains.
    pub fn queue(&self) -> &NotifyQueue {
        &self.queue
    }

    /// Number of live watchers.
    pub fn active_count(&self) -> usize {
        self.watchers.read().len()
    }

    /// Whether the reactor currently has live watchers.
    pub fn is_active(&self) -> bool {
        !self.watchers.read().is_empty()
    }

    /// Create one watcher per declaration, in declaration order.
    ///
    /// Each selector runs once under dependency tracking to record what it
    /// reads and to capture its baseline output. No effect runs here: the
    /// baseline is the reference point, not a change.
    ///
    /// Activating an already-active reactor is a no-op.
    pub fn activate(&self, component: &C) {
        if self.is_active() {
            return;
        }

        let mut watchers = IndexMap::with_capacity(self.set.len());
        for (index, reaction) in self.set.iter().enumerate() {
            let id = WatcherId::new();
            let (baseline, reads) = {
                let scope = TrackingScope::enter(id);
                let output = reaction.select(component);
                let reads = TrackingScope::collected_reads();
                drop(scope);
                (output, reads)
            };
            self.queue.watch(id, &reads);
            trace!(reaction = %reaction.name(), "watcher subscribed");
            watchers.insert(
                id,
                WatcherState {
                    reaction: index,
                    last: baseline,
                },
            );
        }

        debug!(watchers = watchers.len(), "reactor activated");
        *self.watchers.write() = watchers;
    }

    /// Drain the queue, re-evaluating marked watchers until it settles.
    pub fn flush(&self, component: &C) {
        for _pass in 0..MAX_FLUSH_PASSES {
            let pending = self.queue.take_pending();
            if pending.is_empty() {
                return;
            }

            // Subscription order within the pass.
            let ordered: Vec<(WatcherId, usize)> = {
                let watchers = self.watchers.read();
                watchers
                    .iter()
                    .filter_map(|(id, state)| {
                        pending.contains(id).then_some((*id, state.reaction))
                    })
                    .collect()
            };

            for (watcher_id, reaction_index) in ordered {
                // An earlier effect in this pass may have deactivated us.
                if !self.watchers.read().contains_key(&watcher_id) {
                    continue;
                }
                let Some(reaction) = self.set.get(reaction_index) else {
                    continue;
                };

                let (output, reads) = {
                    let scope = TrackingScope::enter(watcher_id);
                    let output = reaction.select(component);
                    let reads = TrackingScope::collected_reads();
                    drop(scope);
                    (output, reads)
                };
                self.queue.watch(watcher_id, &reads);

                let previous = {
                    let mut watchers = self.watchers.write();
                    match watchers.get_mut(&watcher_id) {
                        Some(state) if state.last != output => {
                            Some(mem::replace(&mut state.last, output.clone()))
                        }
                        _ => None,
                    }
                };

                if let Some(old) = previous {
                    trace!(reaction = %reaction.name(), "reaction effect ran");
                    reaction.run_effect(component, &output, &old);
                }
            }
        }

        warn!(
            max_passes = MAX_FLUSH_PASSES,
            "flush did not settle; leaving remaining marks queued"
        );
    }

    /// Dispose every watcher synchronously.
    ///
    /// Dependency records and pending marks are cleared with them, so an
    /// already-scheduled effect will not run afterwards. Safe to call on a
    /// never-activated or already-deactivated reactor.
    pub fn deactivate(&self) {
        let removed: Vec<WatcherId> = {
            let mut watchers = self.watchers.write();
            watchers.drain(..).map(|(id, _)| id).collect()
        };

        if removed.is_empty() {
            return;
        }

        for id in &removed {
            self.queue.unwatch(*id);
        }
        debug!(watchers = removed.len(), "reactor deactivated");
    }
}

impl<C> Clone for Reactor<C> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
            queue: self.queue.clone(),
            watchers: Arc::clone(&self.watchers),
        }
    }
}

impl<C> std::fmt::Debug for Reactor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("declarations", &self.set.len())
            .field("active_count", &self.active_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
