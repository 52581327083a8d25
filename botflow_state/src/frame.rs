//! Frame and slot data model.
//!
//! A frame is a named scope of state for one conversation, partitioned by
//! `(scope, namespace)`. Slots are the named values inside a frame; each
//! slot may carry a retention policy for its historical values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Retention rule for a slot's historical values.
///
/// Both constraints are enforced together on every write: the TTL pass
/// first, then the count pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotHistoryPolicy {
    /// Maximum number of historical entries retained.
    /// Zero means only the newest entry survives an append.
    pub max_count: usize,
    /// Entries older than this (seconds since write) are removed.
    /// Zero means no TTL limit.
    pub expires_after_secs: u64,
}

impl SlotHistoryPolicy {
    /// Create a policy with no TTL and the given entry cap.
    #[must_use]
    pub const fn keep_last(max_count: usize) -> Self {
        Self {
            max_count,
            expires_after_secs: 0,
        }
    }

    /// Set the entry cap.
    #[must_use]
    pub const fn with_max_count(mut self, max: usize) -> Self {
        self.max_count = max;
        self
    }

    /// Set the TTL in seconds.
    #[must_use]
    pub const fn with_ttl(mut self, secs: u64) -> Self {
        self.expires_after_secs = secs;
        self
    }
}

/// Describes one named value within a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Slot name, unique within its frame
    pub name: String,
    /// Retention policy; absence means no history is kept
    pub history_policy: Option<SlotHistoryPolicy>,
}

impl SlotDefinition {
    /// Define a slot that keeps only its current value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history_policy: None,
        }
    }

    /// Attach a history policy.
    #[must_use]
    pub const fn with_history(mut self, policy: SlotHistoryPolicy) -> Self {
        self.history_policy = Some(policy);
        self
    }
}

/// A named scope of state for one conversation.
///
/// `(scope, namespace)` pairs are unique per conversation. A frame with no
/// slot definitions is a valid empty frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub scope: String,
    pub namespace: String,
    pub slot_definitions: BTreeMap<String, SlotDefinition>,
}

impl Frame {
    /// Create an empty frame.
    #[must_use]
    pub fn new(scope: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            namespace: namespace.into(),
            slot_definitions: BTreeMap::new(),
        }
    }

    /// Add a slot definition.
    #[must_use]
    pub fn with_slot(mut self, definition: SlotDefinition) -> Self {
        self.slot_definitions
            .insert(definition.name.clone(), definition);
        self
    }

    /// Look up a slot definition by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.slot_definitions.get(name)
    }
}

/// One historical value of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub value: serde_json::Value,
    pub written_at: DateTime<Utc>,
}

/// Current value plus retained history for one slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotValue {
    pub current: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

/// Decoded payload of one frame instance.
///
/// This is what the cache serializes to and from the backing store; the
/// cache itself only ever sees the encoded bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    #[serde(default)]
    pub slots: BTreeMap<String, SlotValue>,
}

impl FrameState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw payload; empty payloads decode to an empty state.
    pub fn decode(raw: &[u8]) -> serde_json::Result<Self> {
        if raw.is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_slice(raw)
    }

    /// Encode to the raw payload form.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Current value of a slot, if set.
    #[must_use]
    pub fn value(&self, slot: &str) -> Option<&serde_json::Value> {
        self.slots.get(slot).map(|s| &s.current)
    }

    /// Retained history of a slot, oldest first.
    #[must_use]
    pub fn history(&self, slot: &str) -> &[HistoryEntry] {
        self.slots.get(slot).map_or(&[], |s| s.history.as_slice())
    }
}
