//! Lifecycle Bridge
//!
//! The bridge is where the imperative component lifecycle meets the
//! reactive system. The host drives components through the [`Lifecycle`]
//! hooks; a component that wants reactive behavior embeds a
//! [`StateBridge`] and delegates its hooks to it.
//!
//! # Control Flow
//!
//! - `mount`: the mirrors refresh from the current raw values, then the
//!   reactor activates and baselines every declared reaction.
//!
//! - `update`: the previous and next raw bags go through the equality
//!   gate; judged-real differences republish the mirrors, which marks
//!   dependent watchers. The notify queue is then flushed once.
//!
//! - `unmount`: the reactor deactivates synchronously. Nothing scheduled
//!   before the call survives it.
//!
//! The host serializes lifecycle calls per instance, so the bridge never
//! sees two hooks for the same component run concurrently.

use serde_json::Value;

use crate::observe::{ObservedMirror, Snapshot};
use crate::reactive::{NotifyQueue, ReactionSet, Reactor};

/// The raw bags as they were before the host committed an update.
#[derive(Debug, Clone)]
pub struct PrevFrame {
    /// Props before the update.
    pub props: Snapshot,

    /// State before the update.
    pub state: Snapshot,

    /// Context before the update, if the host surfaced a context change
    /// this cycle. `None` leaves the context mirror untouched.
    pub context: Option<Snapshot>,
}

/// Hooks the host calls on a component, exactly once per cycle each.
pub trait Lifecycle {
    /// The instance was inserted into the tree.
    fn on_mount(&self);

    /// The host committed new raw values. `prev` carries the pre-update
    /// frame; `snapshot` is the host's optional commit payload.
    fn on_update(&self, prev: &PrevFrame, snapshot: Option<&Value>);

    /// The instance is being removed from the tree.
    fn on_unmount(&self);
}

/// What the bridge needs from a component it synchronizes.
pub trait ObservedInstance {
    /// The instance's mirror cells.
    fn mirror(&self) -> &ObservedMirror;

    /// The current raw props, as committed by the host.
    fn current_props(&self) -> Snapshot;

    /// The current raw state, as committed by the host.
    fn current_state(&self) -> Snapshot;

    /// The current raw context. Components without context keep the
    /// default empty bag.
    fn current_context(&self) -> Snapshot {
        Snapshot::new()
    }
}

/// Composed synchronizer: a reactor plus the instance's notify queue.
///
/// A component constructs one bridge, binds its observables to
/// [`StateBridge::queue`], and forwards its lifecycle hooks here.
pub struct StateBridge<C> {
    reactor: Reactor<C>,
    queue: NotifyQueue,
}

impl<C: ObservedInstance> StateBridge<C> {
    /// Create a bridge for a component class's reaction declarations.
    pub fn new(set: ReactionSet<C>) -> Self {
        let queue = NotifyQueue::new();
        let reactor = Reactor::new(set, queue.clone());
        Self { reactor, queue }
    }

    /// The instance's notify queue. Observables the reactions read must be
    /// bound to it.
    pub fn queue(&self) -> &NotifyQueue {
        &self.queue
    }

    /// The reactor driving this instance's watchers.
    pub fn reactor(&self) -> &Reactor<C> {
        &self.reactor
    }

    /// Whether the instance is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.reactor.is_active()
    }

    /// Mount: refresh the mirrors, then activate the watchers.
    ///
    /// Idempotent. The refresh runs first so baselines are taken against
    /// current values rather than construction-time leftovers.
    pub fn mount(&self, component: &C) {
        component
            .mirror()
            .refresh(&component.current_props(), &component.current_state());
        self.reactor.activate(component);
    }

    /// Update: gate the raw bags into the mirrors, then flush the queue.
    pub fn update(&self, component: &C, prev: &PrevFrame) {
        let mirror = component.mirror();
        mirror.sync_props(&prev.props, &component.current_props());
        mirror.sync_state(&prev.state, &component.current_state());
        if let Some(prev_context) = &prev.context {
            mirror.sync_context(prev_context, &component.current_context());
        }
        self.reactor.flush(component);
    }

    /// Flush the queue outside an update cycle.
    ///
    /// Used by write paths that change observables between host updates.
    pub fn flush(&self, component: &C) {
        self.reactor.flush(component);
    }

    /// Unmount: deactivate every watcher synchronously.
    ///
    /// Idempotent, and safe on a never-mounted instance.
    pub fn unmount(&self) {
        self.reactor.deactivate();
    }
}

impl<C> Clone for StateBridge<C> {
    fn clone(&self) -> Self {
        Self {
            reactor: self.reactor.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<C> std::fmt::Debug for StateBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBridge")
            .field("mounted", &self.reactor.is_active())
            .finish()
    }
}
