use serde::Serialize;

use crate::topology::NodeId;

/// Identifier of one dissemination run over a shared graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Which nodes hold the datum during one run.
///
/// Flags only go from false to true. A new run always starts from a new
/// value where only [`NodeId::ORIGIN`] holds the datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dissemination {
    run: RunId,
    has_datum: Vec<bool>,
    holders: usize,
}

impl Dissemination {
    pub fn new(run: RunId, node_count: usize) -> Self {
        let mut has_datum = vec![false; node_count];
        let holders = match has_datum.first_mut() {
            Some(origin) => {
                *origin = true;
                1
            }
            None => 0,
        };
        Self {
            run,
            has_datum,
            holders,
        }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn node_count(&self) -> usize {
        self.has_datum.len()
    }

    pub fn has_datum(&self, node: NodeId) -> bool {
        self.has_datum
            .get(node.as_usize())
            .copied()
            .unwrap_or(false)
    }

    /// Number of nodes holding the datum.
    pub fn holders(&self) -> usize {
        self.holders
    }

    /// Every node holds the datum.
    pub fn is_converged(&self) -> bool {
        self.holders == self.has_datum.len()
    }

    /// Holders in ascending id order.
    pub fn holder_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.has_datum
            .iter()
            .enumerate()
            .filter(|(_, has)| **has)
            .map(|(index, _)| NodeId::new(index))
    }

    /// Hands the datum to `node`. Returns whether the node is a new holder.
    pub(crate) fn deliver(&mut self, node: NodeId) -> bool {
        match self.has_datum.get_mut(node.as_usize()) {
            Some(flag) if !*flag => {
                *flag = true;
                self.holders += 1;
                true
            }
            _ => false,
        }
    }
}
