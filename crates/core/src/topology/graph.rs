use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{empty_neighbors, NodeId, Topology};
use crate::simulation::SimulationRng;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("cannot place {requested} distinct edges among {nodes} nodes (at most {max})")]
    TooManyEdges {
        nodes: usize,
        requested: usize,
        max: usize,
    },
    #[error("node {node} does not exist in a graph of {nodes} nodes")]
    UnknownNode { node: NodeId, nodes: usize },
    #[error(
        "no graph with every node reachable from {origin} within {max_hops} hops \
         after {attempts} attempts"
    )]
    Unreachable {
        origin: NodeId,
        max_hops: usize,
        attempts: usize,
    },
}

/// How randomly placed links are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Each link is a single one-way edge.
    Directed,
    /// Each link is stored as an edge in both directions.
    #[default]
    Undirected,
}

impl EdgeKind {
    fn max_links(self, node_count: usize) -> usize {
        let ordered_pairs = node_count.saturating_mul(node_count.saturating_sub(1));
        match self {
            EdgeKind::Directed => ordered_pairs,
            EdgeKind::Undirected => ordered_pairs / 2,
        }
    }
}

/// Fixed directed graph. Node `i` owns the outbound edge set `edges[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    edges: Vec<BTreeSet<NodeId>>,
    edge_count: usize,
}

impl Graph {
    /// Builds a graph from explicit directed `(from, to)` pairs.
    ///
    /// Duplicate pairs collapse into one edge.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::empty(node_count);
        for (from, to) in edges {
            for endpoint in [from, to] {
                if endpoint >= node_count {
                    return Err(GraphError::UnknownNode {
                        node: NodeId::new(endpoint),
                        nodes: node_count,
                    });
                }
            }
            graph.insert_edge(NodeId::new(from), NodeId::new(to));
        }
        Ok(graph)
    }

    /// Builds a graph with `links` distinct links placed uniformly at random
    /// between distinct nodes.
    pub fn random(
        node_count: usize,
        links: usize,
        kind: EdgeKind,
        rng: &mut SimulationRng,
    ) -> Result<Self, GraphError> {
        let max = kind.max_links(node_count);
        if links > max {
            return Err(GraphError::TooManyEdges {
                nodes: node_count,
                requested: links,
                max,
            });
        }

        let mut graph = Self::empty(node_count);
        let mut placed = 0;
        while placed < links {
            let from = NodeId::new(rng.gen_range(0..node_count));
            let to = NodeId::new(rng.gen_range(0..node_count));
            if from == to {
                continue;
            }
            let inserted = match kind {
                EdgeKind::Directed => graph.insert_edge(from, to),
                EdgeKind::Undirected => {
                    let forward = graph.insert_edge(from, to);
                    let backward = graph.insert_edge(to, from);
                    forward || backward
                }
            };
            if inserted {
                placed += 1;
            }
        }
        Ok(graph)
    }

    /// Regenerates random graphs until [`NodeId::ORIGIN`] reaches every node
    /// within `max_hops`, giving up after `max_attempts` graphs.
    pub fn generate_connected(
        node_count: usize,
        links: usize,
        kind: EdgeKind,
        max_hops: usize,
        max_attempts: usize,
        rng: &mut SimulationRng,
    ) -> Result<Self, GraphError> {
        for attempt in 1..=max_attempts {
            let graph = Self::random(node_count, links, kind, rng)?;
            let reachable = graph.reachability(NodeId::ORIGIN, max_hops)?;
            if reachable.len() == node_count {
                tracing::debug!(attempt, node_count, links, "Generated connected graph");
                return Ok(graph);
            }
            tracing::trace!(
                attempt,
                reachable = reachable.len(),
                "Graph not fully reachable, regenerating"
            );
        }
        Err(GraphError::Unreachable {
            origin: NodeId::ORIGIN,
            max_hops,
            attempts: max_attempts,
        })
    }

    /// Minimum hop distance from `start` to every node reachable within
    /// `max_hops`. `start` itself is at distance 0.
    pub fn reachability(
        &self,
        start: NodeId,
        max_hops: usize,
    ) -> Result<BTreeMap<NodeId, usize>, GraphError> {
        if start.as_usize() >= self.node_count() {
            return Err(GraphError::UnknownNode {
                node: start,
                nodes: self.node_count(),
            });
        }

        let mut distances = BTreeMap::from([(start, 0)]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let hops = distances[&node];
            if hops == max_hops {
                continue;
            }
            for &next in self.neighbors(node) {
                if !distances.contains_key(&next) {
                    distances.insert(next, hops + 1);
                    queue.push_back(next);
                }
            }
        }
        Ok(distances)
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn empty(node_count: usize) -> Self {
        Self {
            edges: vec![BTreeSet::new(); node_count],
            edge_count: 0,
        }
    }

    fn insert_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let inserted = self.edges[from.as_usize()].insert(to);
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }
}

impl Topology for Graph {
    fn node_count(&self) -> usize {
        self.edges.len()
    }

    fn neighbors(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.edges
            .get(node.as_usize())
            .unwrap_or(empty_neighbors())
    }
}

/// Number of nodes at each hop distance from a start node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HopHistogram {
    /// hop distance -> nodes at that distance
    pub by_hops: BTreeMap<usize, usize>,
    /// nodes not reachable within the hop bound
    pub unreachable: usize,
}

impl HopHistogram {
    pub fn from_reachability(reachability: &BTreeMap<NodeId, usize>, node_count: usize) -> Self {
        let mut by_hops = BTreeMap::new();
        for hops in reachability.values() {
            *by_hops.entry(*hops).or_insert(0) += 1;
        }
        Self {
            by_hops,
            unreachable: node_count.saturating_sub(reachability.len()),
        }
    }
}

impl std::fmt::Display for HopHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (hops, count) in &self.by_hops {
            writeln!(f, "{hops} hops: {count}")?;
        }
        if self.unreachable > 0 {
            writeln!(f, "unreachable: {}", self.unreachable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> Graph {
        Graph::from_edges(len, (0..len.saturating_sub(1)).map(|i| (i, i + 1))).unwrap()
    }

    #[test]
    fn from_edges_rejects_unknown_endpoint() {
        let err = Graph::from_edges(2, [(0, 5)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownNode {
                node: NodeId::new(5),
                nodes: 2
            }
        );
    }

    #[test]
    fn from_edges_collapses_duplicates() {
        let graph = Graph::from_edges(2, [(0, 1), (0, 1)]).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.is_neighbor(NodeId::new(0), NodeId::new(1)));
        assert!(!graph.is_neighbor(NodeId::new(1), NodeId::new(0)));
    }

    #[test]
    fn random_directed_graph_has_requested_edges() {
        let mut rng = SimulationRng::new(7);
        let graph = Graph::random(100, 200, EdgeKind::Directed, &mut rng).unwrap();
        assert_eq!(graph.node_count(), 100);
        assert_eq!(graph.edge_count(), 200);
        let mut counted = 0;
        graph.for_each_node(|node, neighbors| {
            assert!(!neighbors.contains(&node), "no self loops");
            counted += neighbors.len();
        });
        assert_eq!(counted, 200);
    }

    #[test]
    fn random_undirected_graph_is_symmetric() {
        let mut rng = SimulationRng::new(7);
        let graph = Graph::random(50, 80, EdgeKind::Undirected, &mut rng).unwrap();
        assert_eq!(graph.edge_count(), 160);
        graph.for_each_node(|node, neighbors| {
            for &peer in neighbors {
                assert!(graph.is_neighbor(peer, node));
            }
        });
    }

    #[test]
    fn random_graph_can_be_complete() {
        let mut rng = SimulationRng::new(7);
        let graph = Graph::random(4, 12, EdgeKind::Directed, &mut rng).unwrap();
        assert_eq!(graph.edge_count(), 12);
        let graph = Graph::random(4, 6, EdgeKind::Undirected, &mut rng).unwrap();
        assert_eq!(graph.edge_count(), 12);
    }

    #[test]
    fn random_graph_rejects_too_many_edges() {
        let mut rng = SimulationRng::new(7);
        let err = Graph::random(3, 7, EdgeKind::Directed, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GraphError::TooManyEdges {
                nodes: 3,
                requested: 7,
                max: 6
            }
        );
        assert!(Graph::random(3, 4, EdgeKind::Undirected, &mut rng).is_err());
        assert!(Graph::random(1, 1, EdgeKind::Directed, &mut rng).is_err());
    }

    #[test]
    fn reachability_respects_hop_bound() {
        let graph = chain(5);
        let within_two = graph.reachability(NodeId::ORIGIN, 2).unwrap();
        assert_eq!(
            within_two.into_iter().collect::<Vec<_>>(),
            vec![(NodeId::new(0), 0), (NodeId::new(1), 1), (NodeId::new(2), 2)]
        );
        assert_eq!(graph.reachability(NodeId::ORIGIN, 10).unwrap().len(), 5);
    }

    #[test]
    fn reachability_uses_minimum_distance() {
        let graph = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (0, 3)]).unwrap();
        let distances = graph.reachability(NodeId::ORIGIN, 10).unwrap();
        assert_eq!(distances[&NodeId::new(3)], 1);
        assert_eq!(distances[&NodeId::new(2)], 2);
    }

    #[test]
    fn reachability_unknown_start() {
        let graph = chain(2);
        assert!(graph.reachability(NodeId::new(2), 1).is_err());
    }

    #[test]
    fn generate_connected_reaches_everyone() {
        let mut rng = SimulationRng::new(99);
        let graph =
            Graph::generate_connected(100, 200, EdgeKind::Undirected, 10, 1_000, &mut rng).unwrap();
        assert_eq!(graph.reachability(NodeId::ORIGIN, 10).unwrap().len(), 100);

        let graph =
            Graph::generate_connected(10, 60, EdgeKind::Directed, 10, 1_000, &mut rng).unwrap();
        assert_eq!(graph.reachability(NodeId::ORIGIN, 10).unwrap().len(), 10);
    }

    #[test]
    fn generate_connected_gives_up() {
        let mut rng = SimulationRng::new(99);
        // one edge can never connect three nodes
        let err =
            Graph::generate_connected(3, 1, EdgeKind::Undirected, 10, 5, &mut rng).unwrap_err();
        assert!(matches!(err, GraphError::Unreachable { attempts: 5, .. }));
    }

    #[test]
    fn histogram_groups_by_hops() {
        let graph = Graph::from_edges(5, [(0, 1), (0, 2), (1, 3)]).unwrap();
        let reach = graph.reachability(NodeId::ORIGIN, 10).unwrap();
        let histogram = HopHistogram::from_reachability(&reach, graph.node_count());
        assert_eq!(
            histogram.by_hops,
            BTreeMap::from([(0, 1), (1, 2), (2, 1)])
        );
        assert_eq!(histogram.unreachable, 1);
        assert_eq!(
            histogram.to_string(),
            "0 hops: 1\n1 hops: 2\n2 hops: 1\nunreachable: 1\n"
        );
    }
}
