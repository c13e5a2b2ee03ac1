//! Reactive Primitives
//!
//! This module implements the push-based half of the crate: observable
//! cells, reaction declarations, and the per-instance machinery that runs
//! effects when watched values change.
//!
//! # Concepts
//!
//! ## Observables
//!
//! An [`Observable`] is a container for mutable state. Reads inside a
//! tracking scope are recorded as dependencies; writes of an equal value are
//! suppressed, and real changes mark dependents through the bound notify
//! queue.
//!
//! ## Reactions
//!
//! A reaction is a (selector, effect) pair declared once per component
//! class in a [`ReactionSet`]. The selector derives a value from an
//! instance; the effect runs when that value changes between evaluations.
//!
//! ## Reactor and queue
//!
//! A [`Reactor`] binds a reaction set to one instance: it creates a live
//! watcher per declaration on activation and disposes them all on
//! deactivation. Change notification is deferred: writes mark watchers on
//! the instance's [`NotifyQueue`], and a flush drains the queue once per
//! update cycle, running ready effects in subscription order.

mod context;
mod observable;
mod queue;
mod reaction;
mod reactor;
mod subscription;

pub use context::TrackingScope;
pub use observable::Observable;
pub use queue::NotifyQueue;
pub use reaction::{EffectFn, Reaction, ReactionSet, ReactionSetBuilder, Selector};
pub use reactor::{Reactor, MAX_FLUSH_PASSES};
pub use subscription::{Disposer, ListenerId, ObservableId, WatcherId};
