//! Equality gate and emptiness predicates.
//!
//! The gate decides whether an incoming update is a real change or benign
//! churn. Host frameworks tuck bookkeeping fields into the bags they hand
//! over; those fields change on every render and must never count as a
//! difference, at any nesting depth.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::snapshot::Snapshot;

/// Pluggable emptiness predicate.
pub type EmptinessCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Bookkeeping keys ignored by the default gate.
pub const DEFAULT_IGNORED_KEYS: [&str; 2] = ["__owner", "__typetag"];

/// Deep structural equality with an ignore list.
///
/// Total over all value shapes, symmetric, and never panics. Ignored keys
/// compare equal wherever they appear in the tree. A key missing from one
/// side makes the sides unequal unless it is ignored.
#[derive(Debug, Clone)]
pub struct EqualityGate {
    ignored_keys: Vec<String>,
}

impl EqualityGate {
    /// Gate with the default bookkeeping ignore list.
    pub fn new() -> Self {
        Self::with_ignored_keys(DEFAULT_IGNORED_KEYS)
    }

    /// Gate with a custom ignore list.
    pub fn with_ignored_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            ignored_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the gate ignores the given key.
    pub fn ignores(&self, key: &str) -> bool {
        self.ignored_keys.iter().any(|ignored| ignored == key)
    }

    /// Compare two possibly-absent values.
    ///
    /// Two absent values are equal; an absent value never equals a present
    /// one, including `Null`.
    pub fn equal(&self, a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.equal_values(a, b),
            _ => false,
        }
    }

    /// Compare two values deeply, skipping ignored keys.
    pub fn equal_values(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(a), Value::Object(b)) => self.objects_equal(a, b),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| self.equal_values(x, y))
            }
            _ => a == b,
        }
    }

    /// Compare two snapshots deeply, skipping ignored keys.
    pub fn equal_snapshots(&self, a: &Snapshot, b: &Snapshot) -> bool {
        self.objects_equal(a.as_map(), b.as_map())
    }

    fn objects_equal(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
        for (key, a_value) in a {
            if self.ignores(key) {
                continue;
            }
            match b.get(key) {
                Some(b_value) if self.equal_values(a_value, b_value) => {}
                _ => return false,
            }
        }

        // Keys present only on the right side also count, unless ignored.
        b.keys().all(|key| self.ignores(key) || a.contains_key(key))
    }
}

impl Default for EqualityGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a value counts as empty.
///
/// `Null`, the empty string, the empty array, and the empty object are
/// empty. Numbers and booleans never are: a deliberately chosen `0` or
/// `false` is a real value.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Whether an optional value is present and non-empty.
pub fn is_present(value: Option<&Value>) -> bool {
    value.map_or(false, |v| !is_empty(v))
}
