//! Observation Layer
//!
//! Plain-data snapshots of component fields, the equality gate that judges
//! whether an update is a real change, and the observed mirror that
//! republishes judged-real changes into the reactive system.

mod compare;
mod mirror;
mod snapshot;

pub use compare::{is_empty, is_present, EmptinessCheck, EqualityGate, DEFAULT_IGNORED_KEYS};
pub use mirror::ObservedMirror;
pub use snapshot::{Snapshot, SnapshotError};
