/// Simulator configuration: defaults, configuration file and command line.
pub mod config;

/// Policy comparison over a single generated network.
pub mod experiment;

/// Text and JSON rendering of experiment results.
pub mod report;

/// Gossip rounds, peer selection policies and their supporting state.
pub mod simulation;

/// Network graph, random generation and reachability.
pub mod topology;

/// Tracing and logging infrastructure.
mod tracing;
