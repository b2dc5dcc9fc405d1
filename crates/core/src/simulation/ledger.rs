//! Failure history used by the adaptive peer selection policies.
//!
//! For every source node the ledger remembers how many gossip attempts
//! towards each candidate peer failed because the candidate was not a
//! neighbor. Counts only ever grow: nothing is decayed or evicted, so the
//! caller decides the ledger's lifetime by choosing when to create a new one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::topology::NodeId;

/// Per `(source, candidate)` count of failed gossip attempts.
///
/// Uses BTreeMap so iteration (and serialized reports) are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureLedger {
    failures: BTreeMap<NodeId, BTreeMap<NodeId, u32>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt from `node` towards `peer`.
    pub fn record_failure(&mut self, node: NodeId, peer: NodeId) {
        let count = self
            .failures
            .entry(node)
            .or_default()
            .entry(peer)
            .or_insert(0);
        *count = count.saturating_add(1);
        tracing::trace!(%node, %peer, failures = *count, "Recorded gossip failure");
    }

    /// Failures recorded from `node` towards `peer`, zero if none.
    pub fn failures(&self, node: NodeId, peer: NodeId) -> u32 {
        self.failures
            .get(&node)
            .and_then(|peers| peers.get(&peer))
            .copied()
            .unwrap_or(0)
    }

    /// Number of tracked `(source, candidate)` pairs.
    pub fn len(&self) -> usize {
        self.failures.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sum of every recorded failure.
    pub fn total(&self) -> u64 {
        self.failures
            .values()
            .flat_map(BTreeMap::values)
            .map(|count| u64::from(*count))
            .sum()
    }

    /// Overwrites the count for `(node, peer)`.
    #[cfg(test)]
    pub(crate) fn set_failures(&mut self, node: NodeId, peer: NodeId, count: u32) {
        self.failures.entry(node).or_default().insert(peer, count);
    }
}
