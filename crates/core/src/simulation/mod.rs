//! Round based gossip dissemination simulation.
//!
//! # Architecture
//!
//! - **SimulationRng**: seeded RNG behind every random decision
//! - **PopularityIndex**: inbound degree per node, computed once per graph
//! - **FailureLedger**: caller owned history of failed contacts
//! - **PeerSelectionPolicy**: the four strategies under comparison
//! - **GossipEngine**: drives synchronous rounds until full dispersion
//!
//! ```ignore
//! use gossip_sim::simulation::*;
//! use gossip_sim::topology::{EdgeKind, Graph};
//!
//! let mut rng = SimulationRng::new(0x1234);
//! let graph = Graph::generate_connected(100, 200, EdgeKind::Undirected, 10, 1_000, &mut rng)?;
//! let popularity = PopularityIndex::build(&graph);
//! let mut engine = GossipEngine::new(&graph, &popularity, EngineConfig::default());
//!
//! let mut ledger = FailureLedger::new();
//! let report = engine.run(PeerSelectionPolicy::FailureWeighted, &mut ledger, &mut rng)?;
//! println!("converged after {} rounds", report.rounds);
//! ```

mod dissemination;
mod engine;
mod ledger;
mod policy;
mod popularity;
mod rng;

pub use dissemination::{Dissemination, RunId};
pub use engine::{EngineConfig, GossipEngine, RoundOutcome, RunReport, SimulationError};
pub use ledger::FailureLedger;
pub use policy::{PeerSelectionPolicy, SelectionContext};
pub use popularity::PopularityIndex;
pub use rng::SimulationRng;
