//! Simulation configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and command line flags (or their environment
//! variables).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::{
    experiment::LedgerMode,
    report::OutputFormat,
    simulation::{EngineConfig, PeerSelectionPolicy},
    topology::EdgeKind,
};

/// Default number of nodes in the generated network.
pub const DEFAULT_NODES: usize = 100;
/// Default number of random links, 2% of what full direct connectivity needs.
pub const DEFAULT_EDGES: usize = 200;
/// Default bound on hops from node 0 that every node must be within.
pub const DEFAULT_MAX_HOPS: usize = 10;
/// Default number of random graphs tried before giving up on connectivity.
pub const DEFAULT_MAX_GRAPH_ATTEMPTS: usize = 1_000;
/// Default number of rounds after which a run counts as non-convergent.
pub const DEFAULT_ROUND_CAP: usize = 10_000;

#[derive(clap::Parser, Debug, Clone, Default)]
#[command(
    name = "gossip-sim",
    version,
    about = "Gossips a datum across a random network using different peer selection policies"
)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file.
    #[arg(long, env = "GOSSIP_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of nodes in the network.
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Number of random links between nodes.
    #[arg(long)]
    pub edges: Option<usize>,

    /// Whether a link is one-way or works in both directions.
    #[arg(long, value_enum)]
    pub edge_kind: Option<EdgeKind>,

    /// Every node must be reachable from node 0 within this many hops.
    #[arg(long)]
    pub max_hops: Option<usize>,

    /// Random graphs to try before giving up on connectivity.
    #[arg(long)]
    pub max_graph_attempts: Option<usize>,

    /// Rounds after which a run is reported as non-convergent. 0 disables the cap.
    #[arg(long)]
    pub round_cap: Option<usize>,

    /// Seed for every random decision. A random seed is used if not provided.
    #[arg(long, env = "GOSSIP_SIM_SEED")]
    pub seed: Option<u64>,

    /// Policy to simulate, may be repeated. Defaults to all of them.
    #[arg(long = "policy", value_enum)]
    pub policies: Vec<PeerSelectionPolicy>,

    /// Whether runs share failure history or start from an empty ledger.
    #[arg(long, value_enum)]
    pub ledger_mode: Option<LedgerMode>,

    /// Times each policy is simulated over the same graph.
    #[arg(long)]
    pub trials: Option<usize>,

    /// Report format.
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<LevelFilter>,
}

impl ConfigArgs {
    /// Layers the configuration file (if any) and the flags over the defaults.
    pub fn build(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(nodes) = self.nodes {
            config.nodes = nodes;
        }
        if let Some(edges) = self.edges {
            config.edges = edges;
        }
        if let Some(edge_kind) = self.edge_kind {
            config.edge_kind = edge_kind;
        }
        if let Some(max_hops) = self.max_hops {
            config.max_hops = max_hops;
        }
        if let Some(attempts) = self.max_graph_attempts {
            config.max_graph_attempts = attempts;
        }
        if let Some(round_cap) = self.round_cap {
            config.round_cap = round_cap;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if !self.policies.is_empty() {
            config.policies = self.policies;
        }
        if let Some(ledger_mode) = self.ledger_mode {
            config.ledger_mode = ledger_mode;
        }
        if let Some(trials) = self.trials {
            config.trials = trials;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nodes: usize,
    pub edges: usize,
    pub edge_kind: EdgeKind,
    pub max_hops: usize,
    pub max_graph_attempts: usize,
    /// 0 means unlimited.
    pub round_cap: usize,
    pub seed: Option<u64>,
    pub policies: Vec<PeerSelectionPolicy>,
    pub ledger_mode: LedgerMode,
    pub trials: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodes: DEFAULT_NODES,
            edges: DEFAULT_EDGES,
            edge_kind: EdgeKind::default(),
            max_hops: DEFAULT_MAX_HOPS,
            max_graph_attempts: DEFAULT_MAX_GRAPH_ATTEMPTS,
            round_cap: DEFAULT_ROUND_CAP,
            seed: None,
            policies: PeerSelectionPolicy::ALL.to_vec(),
            ledger_mode: LedgerMode::default(),
            trials: 1,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        tracing::debug!(path = ?path, "Reading configuration file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid configuration file {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.nodes == 0 {
            anyhow::bail!("nodes should be higher than 0");
        }
        if self.trials == 0 {
            anyhow::bail!("trials should be higher than 0");
        }
        if self.max_graph_attempts == 0 {
            anyhow::bail!("max_graph_attempts should be higher than 0");
        }
        if self.policies.is_empty() {
            anyhow::bail!("at least one policy is required");
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            round_cap: (self.round_cap > 0).then_some(self.round_cap),
        }
    }
}

/// Installs the global tracing subscriber. Only the first call has effect.
pub fn set_logger(level: Option<LevelFilter>) {
    #[cfg(feature = "trace")]
    {
        use std::sync::atomic::{AtomicBool, Ordering};

        static LOGGER_SET: AtomicBool = AtomicBool::new(false);
        if LOGGER_SET
            .compare_exchange(false, true, Ordering::Release, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        if let Err(err) = crate::tracing::tracer::init_tracer(level) {
            eprintln!("failed tracing initialization: {err}");
        }
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = level;
    }
}
