//! Context Store
//!
//! Process-lifetime key/value state merged into every event. Merges are additive
//! and last-write-wins per key; there is no delete. Snapshots are deep copies, so
//! an event built from a snapshot never changes when the store does.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStore {
    values: Map<String, Value>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite or add each key of `partial`. Values are taken as-is.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.values.insert(key, value);
        }
    }

    /// Set a single key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Structurally independent copy of the current state.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
