//! Synchronous gossip rounds.
//!
//! In every round each node that held the datum when the round started asks
//! the active policy for a peer, in ascending id order. A pick that is one of
//! the node's neighbors receives the datum. Nodes informed during a round
//! only start gossiping in the next one. Rounds repeat until every node holds
//! the datum or the configured round cap is hit.

use serde::Serialize;

use super::{
    Dissemination, FailureLedger, PeerSelectionPolicy, PopularityIndex, RunId,
    SelectionContext, SimulationRng,
};
use crate::topology::{NodeId, Topology};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("cannot disseminate over an empty topology")]
    EmptyTopology,
    #[error(
        "non-convergent topology: {run} using {policy} reached {holders}/{node_count} nodes \
         in {rounds} rounds"
    )]
    RoundCapExceeded {
        run: RunId,
        policy: PeerSelectionPolicy,
        rounds: usize,
        holders: usize,
        node_count: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rounds after which a run is abandoned. `None` runs until convergence.
    pub round_cap: Option<usize>,
}

/// What happened during a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    /// Nodes that attempted a contact.
    pub senders: usize,
    /// Contacts that reached a neighbor.
    pub deliveries: usize,
    /// Nodes that received the datum for the first time.
    pub newly_informed: usize,
    /// Contacts towards a peer that was not a neighbor.
    pub failed_attempts: usize,
    /// Senders whose policy had no peer to offer.
    pub skipped: usize,
}

/// Result of a converged run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run: RunId,
    pub policy: PeerSelectionPolicy,
    pub rounds: usize,
    pub deliveries: usize,
    pub failed_attempts: usize,
    pub skipped: usize,
    #[serde(skip)]
    pub dissemination: Dissemination,
}

pub struct GossipEngine<'a, T> {
    topology: &'a T,
    popularity: &'a PopularityIndex,
    config: EngineConfig,
    last_run: u64,
}

impl<'a, T: Topology> GossipEngine<'a, T> {
    pub fn new(topology: &'a T, popularity: &'a PopularityIndex, config: EngineConfig) -> Self {
        Self {
            topology,
            popularity,
            config,
            last_run: 0,
        }
    }

    /// Fresh per-run state under a new run id.
    pub fn start_run(&mut self) -> Result<Dissemination, SimulationError> {
        let node_count = self.topology.node_count();
        if node_count == 0 {
            return Err(SimulationError::EmptyTopology);
        }
        self.last_run += 1;
        Ok(Dissemination::new(RunId::new(self.last_run), node_count))
    }

    /// Runs `policy` from a fresh state until every node holds the datum.
    ///
    /// `ledger` is owned by the caller. Adaptive policies read and extend it,
    /// so passing the same ledger to several runs carries failure history
    /// over between them.
    pub fn run(
        &mut self,
        policy: PeerSelectionPolicy,
        ledger: &mut FailureLedger,
        rng: &mut SimulationRng,
    ) -> Result<RunReport, SimulationError> {
        let mut state = self.start_run()?;
        let run = state.run();
        tracing::debug!(%run, %policy, nodes = state.node_count(), "Starting dissemination run");

        let mut report = RunReport {
            run,
            policy,
            rounds: 0,
            deliveries: 0,
            failed_attempts: 0,
            skipped: 0,
            dissemination: state.clone(),
        };

        while !state.is_converged() {
            if let Some(cap) = self.config.round_cap {
                if report.rounds >= cap {
                    tracing::warn!(%run, %policy, rounds = report.rounds, "Round cap exceeded");
                    return Err(SimulationError::RoundCapExceeded {
                        run,
                        policy,
                        rounds: report.rounds,
                        holders: state.holders(),
                        node_count: state.node_count(),
                    });
                }
            }

            let outcome = self.step_round(&mut state, policy, ledger, rng);
            report.rounds += 1;
            report.deliveries += outcome.deliveries;
            report.failed_attempts += outcome.failed_attempts;
            report.skipped += outcome.skipped;
            tracing::trace!(
                %run,
                round = report.rounds,
                holders = state.holders(),
                newly_informed = outcome.newly_informed,
                "Round complete"
            );
        }

        tracing::debug!(
            %run,
            %policy,
            rounds = report.rounds,
            failed_attempts = report.failed_attempts,
            "Dissemination converged"
        );
        report.dissemination = state;
        Ok(report)
    }

    /// Executes one round on `state`.
    ///
    /// Senders are taken from the holders at the start of the round, so a
    /// node informed now does not gossip before the next round.
    pub fn step_round(
        &self,
        state: &mut Dissemination,
        policy: PeerSelectionPolicy,
        ledger: &mut FailureLedger,
        rng: &mut SimulationRng,
    ) -> RoundOutcome {
        let senders: Vec<NodeId> = state.holder_ids().collect();
        let mut ctx = SelectionContext {
            topology: self.topology,
            popularity: self.popularity,
            ledger,
            rng,
        };

        let mut outcome = RoundOutcome {
            senders: senders.len(),
            ..Default::default()
        };
        for source in senders {
            let Some(peer) = policy.select_peer(source, &mut ctx) else {
                outcome.skipped += 1;
                continue;
            };
            if self.topology.is_neighbor(source, peer) {
                outcome.deliveries += 1;
                if state.deliver(peer) {
                    outcome.newly_informed += 1;
                }
            } else {
                outcome.failed_attempts += 1;
            }
        }
        outcome
    }
}
