//! Peer selection policies.
//!
//! Each policy picks the single peer a datum holder contacts in a round. The
//! pick is drawn from the whole id space, so it may not be a neighbor, in
//! which case the contact fails. Adaptive policies remember those failures in
//! the [`FailureLedger`] and weight future picks away from them.

use serde::{Deserialize, Serialize};

use super::{FailureLedger, PopularityIndex, SimulationRng};
use crate::topology::{NodeId, Topology};

/// Popularity above this value gives no extra weight.
const POPULARITY_CAP: usize = 10;
/// Weight every candidate starts with before popularity is added.
const POPULARITY_BASE: f64 = 10.0;
/// Normalizes `base + popularity` into a probability.
const POPULARITY_SCALE: f64 = 20.0;

/// State a policy may consult while choosing a peer.
pub struct SelectionContext<'a, T> {
    pub topology: &'a T,
    pub popularity: &'a PopularityIndex,
    pub ledger: &'a mut FailureLedger,
    pub rng: &'a mut SimulationRng,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PeerSelectionPolicy {
    /// Any node id, uniformly.
    RandomNode,
    /// One of the source's neighbors, uniformly.
    RandomNeighbor,
    /// Any node id, skipping candidates in proportion to past failures.
    FailureWeighted,
    /// Any node id, favoring popular candidates and skipping failed ones.
    PopularityWeighted,
}

impl PeerSelectionPolicy {
    pub const ALL: [PeerSelectionPolicy; 4] = [
        PeerSelectionPolicy::RandomNode,
        PeerSelectionPolicy::RandomNeighbor,
        PeerSelectionPolicy::FailureWeighted,
        PeerSelectionPolicy::PopularityWeighted,
    ];

    /// Whether the policy reads and writes the failure ledger.
    pub fn is_adaptive(self) -> bool {
        matches!(
            self,
            PeerSelectionPolicy::FailureWeighted | PeerSelectionPolicy::PopularityWeighted
        )
    }

    /// Picks the peer `source` tries to gossip with.
    ///
    /// Returns `None` when there is nothing to pick from: a node without
    /// neighbors under [`PeerSelectionPolicy::RandomNeighbor`], or an empty
    /// candidate pool under the weighted policies. The node then sits the
    /// round out; no failure is recorded.
    pub fn select_peer<T: Topology>(
        self,
        source: NodeId,
        ctx: &mut SelectionContext<'_, T>,
    ) -> Option<NodeId> {
        match self {
            PeerSelectionPolicy::RandomNode => {
                let node_count = ctx.topology.node_count();
                (node_count > 0).then(|| NodeId::new(ctx.rng.gen_range(0..node_count)))
            }
            PeerSelectionPolicy::RandomNeighbor => {
                let neighbors: Vec<NodeId> =
                    ctx.topology.neighbors(source).iter().copied().collect();
                ctx.rng.choose(&neighbors).copied()
            }
            PeerSelectionPolicy::FailureWeighted | PeerSelectionPolicy::PopularityWeighted => {
                let pool = self.candidate_pool(source, ctx);
                let peer = ctx.rng.choose(&pool).copied();
                match peer {
                    Some(peer) if !ctx.topology.is_neighbor(source, peer) => {
                        ctx.ledger.record_failure(source, peer);
                    }
                    Some(_) => {}
                    None => {
                        tracing::trace!(%source, policy = %self, "Empty candidate pool");
                    }
                }
                peer
            }
        }
    }

    /// Probability that `candidate` enters the pool `source` picks from.
    ///
    /// Uniform policies include everyone. Values above 1 mean certain
    /// inclusion.
    pub fn inclusion_probability(
        self,
        source: NodeId,
        candidate: NodeId,
        popularity: &PopularityIndex,
        ledger: &FailureLedger,
    ) -> f64 {
        let failures = f64::from(ledger.failures(source, candidate));
        match self {
            PeerSelectionPolicy::RandomNode | PeerSelectionPolicy::RandomNeighbor => 1.0,
            PeerSelectionPolicy::FailureWeighted => 1.0 / (1.0 + failures),
            PeerSelectionPolicy::PopularityWeighted => {
                let popularity = popularity.get(candidate).min(POPULARITY_CAP) as f64;
                (popularity + POPULARITY_BASE) / ((failures + 1.0) * POPULARITY_SCALE)
            }
        }
    }

    /// Includes every node id independently with its inclusion probability.
    fn candidate_pool<T: Topology>(
        self,
        source: NodeId,
        ctx: &mut SelectionContext<'_, T>,
    ) -> Vec<NodeId> {
        (0..ctx.topology.node_count())
            .map(NodeId::new)
            .filter(|&candidate| {
                let p = self.inclusion_probability(source, candidate, ctx.popularity, ctx.ledger);
                ctx.rng.gen_bool(p)
            })
            .collect()
    }
}

impl std::fmt::Display for PeerSelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PeerSelectionPolicy::RandomNode => "Random selection from all nodes",
            PeerSelectionPolicy::RandomNeighbor => "Random selection from nodes' edges",
            PeerSelectionPolicy::FailureWeighted => "Failure-weighted selection from all nodes",
            PeerSelectionPolicy::PopularityWeighted => {
                "Popularity and failure weighted selection from all nodes"
            }
        };
        f.write_str(label)
    }
}
