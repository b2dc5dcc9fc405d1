use std::collections::HashMap;

use crate::topology::{NodeId, Topology};

/// Inbound degree of every node, computed once from a topology.
#[derive(Debug, Clone, Default)]
pub struct PopularityIndex {
    inbound: HashMap<NodeId, usize>,
}

impl PopularityIndex {
    /// Counts, for every node, how many other nodes list it as a neighbor.
    /// Each outbound edge set is inspected exactly once.
    pub fn build<T: Topology>(topology: &T) -> Self {
        let mut inbound = HashMap::new();
        topology.for_each_node(|_, neighbors| {
            for &peer in neighbors {
                *inbound.entry(peer).or_insert(0) += 1;
            }
        });
        Self { inbound }
    }

    /// Inbound degree of `node`, zero for nodes nobody points at.
    pub fn get(&self, node: NodeId) -> usize {
        self.inbound.get(&node).copied().unwrap_or(0)
    }
}
