#![forbid(unsafe_code)]

//! Voxel density and spectral smoothing stage.
//!
//! Edges are rasterized into a cubic density grid, the grid is blurred and masked
//! in the frequency domain, and every edge gets a list of interior points. The
//! stage draws no random numbers: the same node and edge tables always produce the
//! same output.
//!
//! The filtered density field is summarized in the report but does not feed the
//! interior points, which are straight interpolations between the endpoints.

use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, SmoothingConfig};
use crate::model::{Edge, Node, NodeId, Point3, SmoothedEdge};

/// Grid storage and the domain-to-grid mapping.
pub mod grid;
/// Interior point generation.
pub mod interpolate;
/// Segment rasterization strategies.
pub mod raster;
/// Gaussian blur and spectral masking.
pub mod spectral;

pub use grid::{GridMapping, GridStats, Voxel, VoxelGrid};
pub use interpolate::PathInterpolator;
pub use raster::{
    bresenham_3d, ExactRasterizer, RasterStrategy, SampledRasterizer, SegmentRasterizer,
};
pub use spectral::{gaussian_blur, MaskSummary, SmoothedField, SpectralSmoother};

/// Node positions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    positions: FxHashMap<NodeId, Point3>,
}

impl NodeIndex {
    /// Indexes `nodes`. A repeated id keeps its last position.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut positions = FxHashMap::default();
        positions.reserve(nodes.len());
        for node in nodes {
            positions.insert(node.id, node.pos);
        }
        Self { positions }
    }

    /// Position of `id`.
    pub fn get(&self, id: NodeId) -> Option<Point3> {
        self.positions.get(&id).copied()
    }

    /// Both endpoint positions, or `None` if either is unknown.
    pub fn endpoints(&self, edge: &Edge) -> Option<(Point3, Point3)> {
        Some((self.get(edge.source)?, self.get(edge.target)?))
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if no node is indexed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Rasterization counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RasterReport {
    /// Edges whose segment was rasterized.
    pub rasterized: u64,
    /// Edges dropped for an unknown endpoint.
    pub skipped: u64,
    /// Voxel increments applied.
    pub voxel_visits: u64,
}

/// Adds one to every voxel each edge visits. Edges with an unknown endpoint are
/// skipped.
pub fn rasterize_edges(
    index: &NodeIndex,
    edges: &[Edge],
    mapping: &GridMapping,
    rasterizer: &dyn SegmentRasterizer,
    grid: &mut VoxelGrid,
) -> RasterReport {
    let mut report = RasterReport::default();
    let mut path: Vec<Voxel> = Vec::new();
    for edge in edges {
        let Some((source, target)) = index.endpoints(edge) else {
            debug!(
                source = edge.source,
                target = edge.target,
                "smooth.raster.unknown_endpoint"
            );
            report.skipped += 1;
            continue;
        };
        path.clear();
        rasterizer.rasterize(mapping, mapping.to_grid(source), mapping.to_grid(target), &mut path);
        for &voxel in &path {
            grid.increment(voxel);
        }
        report.rasterized += 1;
        report.voxel_visits += path.len() as u64;
    }
    report
}

/// Spectral pass summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralReport {
    /// Mask threshold and component counts.
    pub mask: MaskSummary,
    /// Statistics of the smoothed field.
    pub field: GridStats,
}

/// Summary of a smoothing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothReport {
    /// Nodes indexed.
    pub nodes: u64,
    /// Edges read.
    pub edges_read: u64,
    /// Smoothed records produced.
    pub edges_smoothed: u64,
    /// Edges dropped for an unknown endpoint.
    pub edges_skipped: u64,
    /// Voxels per axis.
    pub grid_size: usize,
    /// Strategy used for rasterization.
    pub strategy: RasterStrategy,
    /// Rasterization counters.
    pub raster: RasterReport,
    /// Statistics of the raw density grid.
    pub density: GridStats,
    /// Spectral pass summary; absent when the pass is disabled.
    pub spectral: Option<SpectralReport>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// Output of a smoothing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothOutput {
    /// One record per edge with known endpoints, in input order.
    pub edges: Vec<SmoothedEdge>,
    /// Run summary.
    pub report: SmoothReport,
}

/// Runs the smoothing stage for one immutable configuration.
#[derive(Debug, Clone)]
pub struct SmoothingPipeline {
    cfg: SmoothingConfig,
    mapping: GridMapping,
}

impl SmoothingPipeline {
    /// Validates `cfg` and builds a pipeline.
    pub fn new(cfg: &SmoothingConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg: cfg.clone(),
            mapping: GridMapping::new(cfg.domain, cfg.grid_size),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &SmoothingConfig {
        &self.cfg
    }

    /// Domain-to-grid mapping in use.
    pub fn mapping(&self) -> &GridMapping {
        &self.mapping
    }

    /// Builds the raw density grid for `edges`.
    pub fn density(&self, index: &NodeIndex, edges: &[Edge]) -> (VoxelGrid, RasterReport) {
        let rasterizer = self.cfg.raster.rasterizer(self.cfg.raster_samples);
        let mut grid = VoxelGrid::zeros(self.cfg.grid_size);
        let report = rasterize_edges(index, edges, &self.mapping, rasterizer.as_ref(), &mut grid);
        (grid, report)
    }

    /// Interior points for every edge with known endpoints, in input order.
    pub fn interpolate(&self, index: &NodeIndex, edges: &[Edge]) -> Vec<SmoothedEdge> {
        let interpolator = PathInterpolator::new(self.cfg.path_points);
        edges
            .iter()
            .filter_map(|edge| {
                let (source, target) = index.endpoints(edge)?;
                Some(interpolator.smooth_edge(edge.source, source, edge.target, target))
            })
            .collect()
    }

    /// Rasterizes, smooths and interpolates.
    pub fn run(&self, nodes: &[Node], edges: &[Edge]) -> SmoothOutput {
        let start = Instant::now();
        let index = NodeIndex::from_nodes(nodes);

        let (grid, raster) = self.density(&index, edges);
        let density = grid.stats();
        info!(
            edges = edges.len(),
            rasterized = raster.rasterized,
            skipped = raster.skipped,
            voxel_visits = raster.voxel_visits,
            occupied = density.nonzero,
            strategy = ?self.cfg.raster,
            "smooth.raster.done"
        );

        let spectral = if self.cfg.spectral {
            let smoothed = SpectralSmoother::from_config(&self.cfg).smooth(grid);
            let field = smoothed.field.stats();
            info!(
                threshold = smoothed.mask.threshold,
                kept = smoothed.mask.kept,
                zeroed = smoothed.mask.zeroed,
                field_min = field.min,
                field_max = field.max,
                "smooth.spectral.done"
            );
            Some(SpectralReport {
                mask: smoothed.mask,
                field,
            })
        } else {
            None
        };

        let smoothed = self.interpolate(&index, edges);
        let report = SmoothReport {
            nodes: index.len() as u64,
            edges_read: edges.len() as u64,
            edges_smoothed: smoothed.len() as u64,
            edges_skipped: (edges.len() - smoothed.len()) as u64,
            grid_size: self.cfg.grid_size,
            strategy: self.cfg.raster,
            raster,
            density,
            spectral,
            duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            edges_smoothed = report.edges_smoothed,
            edges_skipped = report.edges_skipped,
            duration_ms = report.duration_ms,
            "smooth.completed"
        );
        SmoothOutput {
            edges: smoothed,
            report,
        }
    }
}
