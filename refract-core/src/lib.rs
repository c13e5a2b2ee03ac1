//! Refract Core
//!
//! This crate provides the state-synchronization runtime for the Refract
//! component framework. It implements:
//!
//! - Reactive primitives (observables, reactions, the flush loop)
//! - Observed mirrors that republish host data on real change
//! - The lifecycle bridge between host callbacks and reaction spans
//! - Form field value control (defaults, change emission, reset)
//!
//! The crate carries no rendering or scheduling of its own. A host driver
//! constructs components, forwards lifecycle callbacks, and commits raw
//! prop and state frames; everything downstream of those calls lives here.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `observe`: Snapshots, the equality gate, and observed mirrors
//! - `bridge`: Lifecycle trait and the mount/update/unmount bridge
//! - `form`: Form field controller and the host form surface
//!
//! # Example
//!
//! ```rust,ignore
//! use refract_core::form::{FieldProps, FormField};
//! use refract_core::Lifecycle;
//! use refract_core::Snapshot;
//! use serde_json::json;
//!
//! // Construct a field with a declared default
//! let mut attrs = Snapshot::new();
//! attrs.insert("default_value", json!("hello"));
//! let field = FormField::new(
//!     FieldProps::new(attrs).with_change_handler(|value| {
//!         println!("changed: {value}");
//!     }),
//! );
//!
//! // Mount it: reactions subscribe, the reset listener attaches
//! field.on_mount();
//!
//! // A user edit lands and is emitted through the change handler
//! field.emit_value("typed");
//!
//! // Unmount reverses everything synchronously
//! field.on_unmount();
//! ```

pub mod bridge;
pub mod form;
pub mod observe;
pub mod reactive;

pub use bridge::{Lifecycle, ObservedInstance, PrevFrame, StateBridge};
pub use form::{Binding, FieldProps, FieldRef, FormField, FormHandle};
pub use observe::{EqualityGate, ObservedMirror, Snapshot, SnapshotError};
pub use reactive::{Disposer, NotifyQueue, Observable, ReactionSet, ReactionSetBuilder, Reactor};
