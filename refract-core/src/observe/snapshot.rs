//! Snapshot property bags.
//!
//! A [`Snapshot`] is a plain copy of a component's props, state, or context
//! at one point in time. Snapshots never hold references into host memory:
//! once captured, they are independent data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error converting a host value into a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The value could not be serialized at all.
    #[error("value could not be captured as a snapshot: {0}")]
    Capture(#[from] serde_json::Error),

    /// The value serialized to something other than a property bag.
    #[error("captured value is {kind}, expected an object")]
    NotAnObject {
        /// What the value turned out to be.
        kind: &'static str,
    },
}

/// A property bag captured from a component field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Capture any serializable host value as a snapshot.
    ///
    /// The value must serialize to an object; scalars and arrays are
    /// rejected because props, state, and context are always keyed bags.
    pub fn capture<T: Serialize>(value: &T) -> Result<Self, SnapshotError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SnapshotError::NotAnObject {
                kind: value_kind(&other),
            }),
        }
    }

    /// Get a property by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a property, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a property by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag has no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the properties.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the snapshot into a `Value::Object`.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Snapshot {
    type Error = SnapshotError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SnapshotError::NotAnObject {
                kind: value_kind(&other),
            }),
        }
    }
}

/// Human-readable name for a JSON value's type.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
