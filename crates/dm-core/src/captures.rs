//! Catch slots
//!
//! Values captured by `Catch` operators are handed back to the caller in a
//! [`Captures`] map rather than written through shared references, so the
//! caller always sees where a captured value comes from.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{PatternError, PatternResult};

/// Named values captured during one or more comparisons
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Captures {
    slots: IndexMap<String, Value>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw captured value
    pub fn value(&self, slot: &str) -> Option<&Value> {
        self.slots.get(slot)
    }

    /// Captured value read back as `T`; `Ok(None)` when the slot was never written
    pub fn get<T: DeserializeOwned>(&self, slot: &str) -> PatternResult<Option<T>> {
        match self.slots.get(slot) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| PatternError::Capture {
                    slot: slot.to_string(),
                    source,
                }),
        }
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write a slot unless it already holds a value from this run.
    ///
    /// Returns `true` when the value was stored.
    pub(crate) fn write_once(&mut self, slot: String, value: Value) -> bool {
        if self.slots.contains_key(&slot) {
            debug!(slot = %slot, "Catch slot already written in this comparison, ignoring");
            return false;
        }
        self.slots.insert(slot, value);
        true
    }

    /// Fold the captures of a later comparison into this set.
    ///
    /// Slots written by `newer` replace older values.
    pub fn merge(&mut self, newer: Captures) {
        self.slots.extend(newer.slots);
    }
}
