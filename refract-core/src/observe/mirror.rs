//! Observed Mirror
//!
//! The mirror republishes a component's raw props, state, and context into
//! the reactive system. Each of the three is an independent
//! `Observable<Snapshot>` cell that selectors read with dependency tracking.
//!
//! # Refresh Discipline
//!
//! Mirrors are deliberately allowed to go stale between lifecycle updates.
//! On each update the equality gate compares the previous and next raw
//! bags; only a judged-real difference replaces the mirror. Bookkeeping
//! churn from benign re-renders therefore never bumps a mirror's version
//! and never wakes a watcher.
//!
//! Each replacement is a single write of a whole snapshot: a reader sees
//! the old bag or the new bag, never a mix.

use tracing::debug;

use crate::reactive::{NotifyQueue, Observable};

use super::compare::EqualityGate;
use super::snapshot::Snapshot;

/// Reactive shadow copies of a component's raw fields.
///
/// Clones share the same cells.
#[derive(Debug, Clone)]
pub struct ObservedMirror {
    props: Observable<Snapshot>,
    state: Observable<Snapshot>,
    context: Observable<Snapshot>,
    gate: EqualityGate,
}

impl ObservedMirror {
    /// Create a mirror seeded with the construction-time snapshots.
    ///
    /// The context cell starts empty; it fills the first time the host
    /// surfaces a context change.
    pub fn new(initial_props: Snapshot, initial_state: Snapshot) -> Self {
        Self::with_gate(initial_props, initial_state, EqualityGate::new())
    }

    /// Create a mirror judging changes with a custom gate.
    pub fn with_gate(initial_props: Snapshot, initial_state: Snapshot, gate: EqualityGate) -> Self {
        Self {
            props: Observable::new(initial_props),
            state: Observable::new(initial_state),
            context: Observable::new(Snapshot::new()),
            gate,
        }
    }

    /// The mirrored props cell.
    pub fn props(&self) -> &Observable<Snapshot> {
        &self.props
    }

    /// The mirrored state cell.
    pub fn state(&self) -> &Observable<Snapshot> {
        &self.state
    }

    /// The mirrored context cell.
    pub fn context(&self) -> &Observable<Snapshot> {
        &self.context
    }

    /// The gate this mirror judges updates with.
    pub fn gate(&self) -> &EqualityGate {
        &self.gate
    }

    /// Bind all three cells to the instance's notify queue.
    pub fn bind_queue(&self, queue: &NotifyQueue) {
        self.props.bind_queue(queue);
        self.state.bind_queue(queue);
        self.context.bind_queue(queue);
    }

    /// Refresh the props and state mirrors from the current raw values.
    ///
    /// Runs at mount, before watchers take their baselines, so selectors
    /// never observe pre-mount leftovers.
    pub fn refresh(&self, props: &Snapshot, state: &Snapshot) {
        debug!("mirrors refreshed from raw values");
        self.props.set(props.clone());
        self.state.set(state.clone());
    }

    /// Republish props if the gate judges `prev` and `next` different.
    ///
    /// Returns whether the mirror was replaced.
    pub fn sync_props(&self, prev: &Snapshot, next: &Snapshot) -> bool {
        if self.gate.equal_snapshots(prev, next) {
            return false;
        }
        debug!("props mirror refreshed");
        self.props.set(next.clone());
        true
    }

    /// Republish state if the gate judges `prev` and `next` different.
    pub fn sync_state(&self, prev: &Snapshot, next: &Snapshot) -> bool {
        if self.gate.equal_snapshots(prev, next) {
            return false;
        }
        debug!("state mirror refreshed");
        self.state.set(next.clone());
        true
    }

    /// Republish context if the gate judges `prev` and `next` different.
    ///
    /// Called only when the host surfaces a context change.
    pub fn sync_context(&self, prev: &Snapshot, next: &Snapshot) -> bool {
        if self.gate.equal_snapshots(prev, next) {
            return false;
        }
        debug!("context mirror refreshed");
        self.context.set(next.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: serde_json::Value) -> Snapshot {
        Snapshot::try_from(value).unwrap()
    }

    #[test]
    fn refresh_overwrites_both_cells() {
        let mirror = ObservedMirror::new(Snapshot::new(), Snapshot::new());
        let props = bag(json!({ "value": "p" }));
        let state = bag(json!({ "count": 1 }));

        mirror.refresh(&props, &state);

        assert_eq!(mirror.props().get_untracked(), props);
        assert_eq!(mirror.state().get_untracked(), state);
    }

    #[test]
    fn bookkeeping_churn_does_not_replace_the_mirror() {
        let prev = bag(json!({ "value": "x", "__owner": 1 }));
        let mirror = ObservedMirror::new(prev.clone(), Snapshot::new());
        let version = mirror.props().version();

        let next = bag(json!({ "value": "x", "__owner": 2 }));
        let replaced = mirror.sync_props(&prev, &next);

        assert!(!replaced);
        assert_eq!(mirror.props().version(), version);
        assert_eq!(mirror.props().get_untracked(), prev);
    }

    #[test]
    fn real_changes_replace_the_mirror() {
        let prev = bag(json!({ "value": "x" }));
        let mirror = ObservedMirror::new(prev.clone(), Snapshot::new());
        let version = mirror.props().version();

        let next = bag(json!({ "value": "y" }));
        let replaced = mirror.sync_props(&prev, &next);

        assert!(replaced);
        assert_eq!(mirror.props().version(), version + 1);
        assert_eq!(mirror.props().get_untracked(), next);
    }

    #[test]
    fn context_starts_empty_and_syncs_on_surfaced_changes() {
        let mirror = ObservedMirror::new(Snapshot::new(), Snapshot::new());
        assert!(mirror.context().get_untracked().is_empty());

        let next = bag(json!({ "theme": "dark" }));
        assert!(mirror.sync_context(&Snapshot::new(), &next));
        assert_eq!(mirror.context().get_untracked(), next);
    }

    #[test]
    fn replaced_mirrors_mark_a_bound_queue() {
        let prev = bag(json!({ "value": "x" }));
        let mirror = ObservedMirror::new(prev.clone(), Snapshot::new());
        let queue = NotifyQueue::new();
        mirror.bind_queue(&queue);

        let watcher = crate::reactive::WatcherId::new();
        queue.watch(watcher, &[mirror.props().id()]);

        // Churn-only update: nothing marked
        mirror.sync_props(&prev, &bag(json!({ "value": "x", "__owner": 9 })));
        assert!(!queue.has_pending());

        // Real update: watcher marked
        mirror.sync_props(&prev, &bag(json!({ "value": "y" })));
        assert!(queue.has_pending());
    }
}
