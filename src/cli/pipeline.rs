use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::{GeneratorConfig, SmoothingConfig};
use crate::error::Result;
use crate::generator::{GenerateReport, NetworkGenerator};
use crate::smoothing::{SmoothReport, SmoothingPipeline};
use crate::tables::{self, EdgeTableWriter, EDGES_FILE, NODES_FILE};

/// Inputs for a generate run.
#[derive(Debug, Clone)]
pub struct GenerateJob {
    /// Generator parameters.
    pub config: GeneratorConfig,
    /// Directory receiving `nodes.tsv` and `edges.tsv`; created when missing.
    pub out_dir: PathBuf,
}

/// Result of a generate run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    /// Path of the nodes table.
    pub nodes_path: PathBuf,
    /// Path of the edges table.
    pub edges_path: PathBuf,
    /// Node rows written.
    pub nodes_written: u64,
    /// Edge rows written.
    pub edges_written: u64,
    /// Generator report.
    pub report: GenerateReport,
}

/// Generates a network and writes both tables.
///
/// Nothing is created on disk until placement succeeds. The nodes table is then
/// complete before the first edge is drawn, and edges are streamed to their table as
/// they are produced.
pub fn run_generate(job: &GenerateJob) -> Result<GenerateSummary> {
    let generator = NetworkGenerator::new(&job.config)?;
    let nodes_path = job.out_dir.join(NODES_FILE);
    let edges_path = job.out_dir.join(EDGES_FILE);

    let mut nodes_written = 0;
    let (report, edges) = generator.run(|placed| {
        fs::create_dir_all(&job.out_dir)?;
        nodes_written = tables::write_nodes(&nodes_path, &placed.nodes)?;
        info!(path = %nodes_path.display(), rows = nodes_written, "generate.nodes.written");
        Ok(EdgeTableWriter::create(&edges_path)?)
    })?;
    let edges_written = edges.finish()?;
    info!(path = %edges_path.display(), rows = edges_written, "generate.edges.written");

    Ok(GenerateSummary {
        nodes_path,
        edges_path,
        nodes_written,
        edges_written,
        report,
    })
}

/// Inputs for a smooth run.
#[derive(Debug, Clone)]
pub struct SmoothJob {
    /// Smoothing parameters.
    pub config: SmoothingConfig,
    /// Nodes table to read.
    pub nodes_path: PathBuf,
    /// Edges table to read.
    pub edges_path: PathBuf,
    /// Smoothed edges table to write.
    pub out_path: PathBuf,
}

/// Result of a smooth run.
#[derive(Debug, Clone, Serialize)]
pub struct SmoothSummary {
    /// Path of the smoothed edges table.
    pub out_path: PathBuf,
    /// Rows written.
    pub rows_written: u64,
    /// Smoothing report.
    pub report: SmoothReport,
}

/// Reads both tables, runs the smoothing stage and writes the smoothed edges.
pub fn run_smooth(job: &SmoothJob) -> Result<SmoothSummary> {
    let pipeline = SmoothingPipeline::new(&job.config)?;
    let nodes = tables::read_nodes(&job.nodes_path)?;
    let edges = tables::read_edges(&job.edges_path)?;
    info!(nodes = nodes.len(), edges = edges.len(), "smooth.tables.read");

    let output = pipeline.run(&nodes, &edges);
    if let Some(parent) = job.out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let rows_written =
        tables::write_smoothed_edges(&job.out_path, &output.edges, job.config.path_points)?;
    info!(path = %job.out_path.display(), rows = rows_written, "smooth.table.written");

    Ok(SmoothSummary {
        out_path: job.out_path.clone(),
        rows_written,
        report: output.report,
    })
}
