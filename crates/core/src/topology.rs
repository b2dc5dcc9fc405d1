//! Network topology the gossip simulation runs over.
//!
//! The simulation only ever reads a topology through the [`Topology`] trait:
//! the number of nodes and each node's outbound edge set. [`Graph`] is the
//! concrete implementation, including random construction and hop-limited
//! reachability used to validate a graph before simulating on it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

mod graph;

pub use graph::{EdgeKind, Graph, GraphError, HopHistogram};

static NO_NEIGHBORS: BTreeSet<NodeId> = BTreeSet::new();

/// Stable identity of a node, its ordinal index in the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// The node every dissemination run starts from.
    pub const ORIGIN: NodeId = NodeId(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of a directed network.
///
/// Node ids are always `0..node_count()`. An edge `a -> b` means a gossip
/// attempt from `a` to `b` succeeds.
pub trait Topology {
    fn node_count(&self) -> usize;

    /// Outbound edge set of `node`. Unknown ids have no neighbors.
    fn neighbors(&self, node: NodeId) -> &BTreeSet<NodeId>;

    fn is_neighbor(&self, node: NodeId, candidate: NodeId) -> bool {
        self.neighbors(node).contains(&candidate)
    }

    /// Visits every node in ascending id order.
    fn for_each_node<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeId, &BTreeSet<NodeId>),
        Self: Sized,
    {
        for index in 0..self.node_count() {
            let node = NodeId::new(index);
            visitor(node, self.neighbors(node));
        }
    }
}

pub(crate) fn empty_neighbors() -> &'static BTreeSet<NodeId> {
    &NO_NEIGHBORS
}
