//! Leaf Registry Module
//!
//! Maps trie leaves to the values stored at them together with their
//! creation time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cache::NodeId;

// == Leaf Entry ==
/// Payload attached to one trie leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    /// Creation timestamp, millisecond resolution is what the scavenger uses
    pub created_at: DateTime<Utc>,
    /// The stored value
    pub value: Vec<u8>,
}

impl LeafEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: Vec<u8>) -> Self {
        Self::created_at(value, Utc::now())
    }

    pub fn created_at(value: Vec<u8>, created_at: DateTime<Utc>) -> Self {
        Self { created_at, value }
    }

    // == Age ==
    /// Milliseconds elapsed between creation and `now`, clamped at zero.
    pub fn age_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.created_at).num_milliseconds().max(0) as u64
    }

    // == Is Stale ==
    /// An entry is stale once its age strictly exceeds `ttl_ms`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_ms: u64) -> bool {
        self.age_ms(now) > ttl_ms
    }
}

// == Leaf Registry ==
/// Leaf id → entry map. A leaf has a row if and only if it holds a live entry.
#[derive(Debug, Default)]
pub struct LeafRegistry {
    entries: HashMap<NodeId, LeafEntry>,
}

impl LeafRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the row for `leaf`. Returns true if the row is new.
    pub fn upsert(&mut self, leaf: NodeId, entry: LeafEntry) -> bool {
        self.entries.insert(leaf, entry).is_none()
    }

    pub fn get(&self, leaf: NodeId) -> Option<&LeafEntry> {
        self.entries.get(&leaf)
    }

    pub fn remove(&mut self, leaf: NodeId) -> Option<LeafEntry> {
        self.entries.remove(&leaf)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stale Leaves ==
    /// Collects the leaves whose entries are older than `ttl_ms` at `now`.
    pub fn stale_leaves(&self, now: DateTime<Utc>, ttl_ms: u64) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_stale(now, ttl_ms))
            .map(|(leaf, _)| *leaf)
            .collect()
    }
}
