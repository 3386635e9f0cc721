#![forbid(unsafe_code)]

//! Clustered power-law network generator.
//!
//! Generation runs in two phases with separate random streams. [`NetworkGenerator::place`]
//! samples the cluster layout and node coordinates from the layout seed, so the node
//! table is reproducible. [`NetworkGenerator::wire`] samples degrees and edges from the
//! wiring stream, which is seeded only when the config asks for it.

use std::io;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, GeneratorConfig};
use crate::model::{Cluster, Node};

/// Bounded power-law degree sampling.
pub mod degree;
/// Cluster sizes, centers and id ranges.
pub mod layout;
/// Per-cluster node coordinates.
pub mod placement;
/// Internal and external edge wiring.
pub mod wiring;

pub use degree::{DegreeSampler, DegreeSequence, ParityFix};
pub use layout::{ClusterLayout, ReconcileReport};
pub use placement::NodePlacer;
pub use wiring::{EdgeSink, EdgeWirer, WiringStats};

/// Errors raised by the generator.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Cluster sizes of at least one cannot sum to the node total.
    #[error("cannot split {nodes} nodes into {clusters} non-empty clusters")]
    InfeasibleLayout {
        /// Requested node total.
        nodes: u64,
        /// Requested cluster count.
        clusters: usize,
    },
    /// A sampling distribution rejected its parameters.
    #[error("invalid distribution parameters: {0}")]
    Distribution(String),
    /// A node id is not covered by the cluster layout.
    #[error("node {node} is outside a layout of {nodes} nodes")]
    NodeOutsideLayout {
        /// Offending id.
        node: u64,
        /// Nodes in the layout.
        nodes: u64,
    },
    /// The node callback or the edge sink failed.
    #[error("generator output failed: {0}")]
    Sink(#[from] io::Error),
}

/// Layout and nodes produced by the placement phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNetwork {
    /// Cluster layout.
    pub layout: ClusterLayout,
    /// Nodes in id order.
    pub nodes: Vec<Node>,
}

impl PlacedNetwork {
    /// Materialized cluster records.
    pub fn clusters(&self) -> Vec<Cluster> {
        self.layout.clusters()
    }
}

/// Summary of a wiring pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WiringReport {
    /// Sum of the degree budgets after the parity fix.
    pub degree_sum: u64,
    /// Parity adjustment, if one was needed.
    pub parity_fix: Option<ParityFix>,
    /// Edge counts.
    pub edges: WiringStats,
}

/// Summary of a full generator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateReport {
    /// Nodes generated.
    pub nodes: u64,
    /// Clusters generated.
    pub clusters: usize,
    /// Smallest cluster size.
    pub min_cluster_size: u64,
    /// Largest cluster size.
    pub max_cluster_size: u64,
    /// Cluster reconciliation summary.
    pub reconcile: ReconcileReport,
    /// Wiring summary.
    pub wiring: WiringReport,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// Runs the generator stage for one immutable configuration.
#[derive(Debug, Clone)]
pub struct NetworkGenerator {
    cfg: GeneratorConfig,
}

impl NetworkGenerator {
    /// Validates `cfg` and builds a generator.
    pub fn new(cfg: &GeneratorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg: cfg.clone() })
    }

    /// Configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.cfg
    }

    /// Samples the cluster layout and node coordinates from the layout seed.
    pub fn place(&self) -> Result<PlacedNetwork, GenerateError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.cfg.layout_seed);
        let layout = ClusterLayout::generate(&self.cfg, &mut rng)?;
        let placer = NodePlacer::new(self.cfg.coord_sigma, self.cfg.domain);
        let nodes = placer.place(&layout, &mut rng)?;
        info!(
            nodes = nodes.len(),
            clusters = layout.len(),
            seed = self.cfg.layout_seed,
            used_fallback = layout.reconcile().used_fallback,
            "generate.place.done"
        );
        Ok(PlacedNetwork { layout, nodes })
    }

    /// Random stream for degree sampling and wiring: seeded from `wiring_seed`,
    /// otherwise from OS entropy.
    pub fn wiring_rng(&self) -> ChaCha8Rng {
        match self.cfg.wiring_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Samples degrees and streams edges into `sink`.
    pub fn wire<S: EdgeSink + ?Sized>(
        &self,
        placed: &PlacedNetwork,
        rng: &mut ChaCha8Rng,
        sink: &mut S,
    ) -> Result<WiringReport, GenerateError> {
        let sampler = DegreeSampler::new(self.cfg.k_min, self.cfg.k_max, self.cfg.gamma);
        let (degrees, parity_fix) = sampler.sample(placed.nodes.len(), rng);
        let edges = EdgeWirer::new(&placed.layout).wire_all(&degrees, rng, sink)?;
        info!(
            degree_sum = degrees.total(),
            parity_adjusted = parity_fix.is_some(),
            internal = edges.internal,
            external = edges.external,
            dropped_external = edges.dropped_external,
            "generate.wire.done"
        );
        Ok(WiringReport {
            degree_sum: degrees.total(),
            parity_fix,
            edges,
        })
    }

    /// Places nodes, asks `open_sink` for an edge sink, then wires edges into it.
    ///
    /// `open_sink` runs only once placement has succeeded and before any edge is
    /// drawn, so callers can persist the node table and create output files lazily.
    /// The sink is handed back with the report.
    pub fn run<S, F>(&self, open_sink: F) -> Result<(GenerateReport, S), GenerateError>
    where
        S: EdgeSink,
        F: FnOnce(&PlacedNetwork) -> io::Result<S>,
    {
        let start = Instant::now();
        let placed = self.place()?;
        let mut sink = open_sink(&placed)?;
        let mut rng = self.wiring_rng();
        let wiring = self.wire(&placed, &mut rng, &mut sink)?;
        let sizes = placed.layout.sizes();
        let report = GenerateReport {
            nodes: placed.layout.total_nodes(),
            clusters: placed.layout.len(),
            min_cluster_size: sizes.iter().copied().min().unwrap_or(0),
            max_cluster_size: sizes.iter().copied().max().unwrap_or(0),
            reconcile: placed.layout.reconcile().clone(),
            wiring,
            duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            nodes = report.nodes,
            edges = report.wiring.edges.total(),
            duration_ms = report.duration_ms,
            "generate.completed"
        );
        Ok((report, sink))
    }
}
