#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use voxgraph::{
    cli::{run_generate, run_smooth, GenerateJob, GenerateSummary, SmoothJob, SmoothSummary},
    config::default_config_path,
    logging::init_logging,
    PipelineConfig, RasterStrategy,
};

#[path = "voxgraph/ui.rs"]
mod ui;

use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "voxgraph",
    version,
    about = "Generate clustered 3D networks and smooth their edges on a voxel grid"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "VOXGRAPH_CONFIG",
        help = "Pipeline config file (TOML); defaults to the per-user config when present"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "VOXGRAPH_LOG",
        default_value = "warn",
        help = "Log filter directive, e.g. info or voxgraph::smoothing=debug"
    )]
    log_level: String,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for run summaries"
    )]
    format: OutputFormat,

    #[arg(long, short, global = true, help = "Suppress progress and decorations")]
    quiet: bool,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a clustered network and write nodes.tsv and edges.tsv.
    Generate(GenerateCmd),
    /// Rasterize and smooth a network, writing one row of interior points per edge.
    Smooth(SmoothCmd),
    /// Print the effective configuration as TOML.
    Config(ConfigCmd),
}

#[derive(Args, Debug)]
struct GenerateCmd {
    #[arg(long, default_value = ".", help = "Directory receiving the node and edge tables")]
    out_dir: PathBuf,

    #[arg(long, help = "Total node count")]
    nodes: Option<u64>,

    #[arg(long, help = "Cluster count")]
    clusters: Option<usize>,

    #[arg(long, help = "Power-law exponent (> 1)")]
    gamma: Option<f64>,

    #[arg(long, help = "Smallest out-degree budget")]
    k_min: Option<u32>,

    #[arg(long, help = "Largest out-degree budget")]
    k_max: Option<u32>,

    #[arg(long, help = "Seed for cluster layout and node placement")]
    seed: Option<u64>,

    #[arg(long, help = "Seed for degrees and edges; fresh entropy when unset")]
    wiring_seed: Option<u64>,
}

#[derive(Args, Debug)]
struct SmoothCmd {
    #[arg(long, default_value = "nodes.tsv", help = "Nodes table to read")]
    nodes: PathBuf,

    #[arg(long, default_value = "edges.tsv", help = "Edges table to read")]
    edges: PathBuf,

    #[arg(long, default_value = "smoothed_edges.tsv", help = "Smoothed edges table to write")]
    out: PathBuf,

    #[arg(long, help = "Voxels per grid axis")]
    grid: Option<usize>,

    #[arg(long, value_enum, help = "Segment rasterization strategy")]
    raster: Option<RasterArg>,

    #[arg(long, help = "Interior points per edge")]
    points: Option<usize>,

    #[arg(long, help = "Skip the blur and spectral mask")]
    no_spectral: bool,
}

#[derive(Args, Debug)]
struct ConfigCmd {
    #[arg(long, help = "Print the default config file location instead")]
    path: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum RasterArg {
    Sampled,
    Exact,
}

impl From<RasterArg> for RasterStrategy {
    fn from(arg: RasterArg) -> Self {
        match arg {
            RasterArg::Sampled => RasterStrategy::Sampled,
            RasterArg::Exact => RasterStrategy::Exact,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    let ui = Ui::new(cli.theme, cli.quiet || cli.format == OutputFormat::Json);
    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate(cmd) => {
            let job = build_generate_job(&cmd, config);
            let task = ui.task("generating network");
            let summary = run_generate(&job)?;
            task.finish();
            emit(cli.format, &summary, || print_generate_text(&ui, &summary))?;
        }
        Command::Smooth(cmd) => {
            let job = build_smooth_job(&cmd, config);
            let task = ui.task("smoothing edges");
            let summary = run_smooth(&job)?;
            task.finish();
            emit(cli.format, &summary, || print_smooth_text(&ui, &summary))?;
        }
        Command::Config(cmd) => {
            if cmd.path {
                let path = default_config_path().ok_or("no config directory on this platform")?;
                emit(cli.format, &path, || println!("{}", path.display()))?;
            } else {
                config.validate()?;
                match cli.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                    OutputFormat::Text => ui.raw(&config.to_toml()?),
                }
            }
        }
    }

    Ok(())
}

fn build_generate_job(cmd: &GenerateCmd, config: PipelineConfig) -> GenerateJob {
    let mut cfg = config.generator;
    if let Some(nodes) = cmd.nodes {
        cfg.num_nodes = nodes;
    }
    if let Some(clusters) = cmd.clusters {
        cfg.num_clusters = clusters;
    }
    if let Some(gamma) = cmd.gamma {
        cfg.gamma = gamma;
    }
    if let Some(k_min) = cmd.k_min {
        cfg.k_min = k_min;
    }
    if let Some(k_max) = cmd.k_max {
        cfg.k_max = k_max;
    }
    if let Some(seed) = cmd.seed {
        cfg.layout_seed = seed;
    }
    if cmd.wiring_seed.is_some() {
        cfg.wiring_seed = cmd.wiring_seed;
    }
    GenerateJob {
        config: cfg,
        out_dir: cmd.out_dir.clone(),
    }
}

fn build_smooth_job(cmd: &SmoothCmd, config: PipelineConfig) -> SmoothJob {
    let mut cfg = config.smoothing;
    if let Some(grid) = cmd.grid {
        cfg.grid_size = grid;
    }
    if let Some(raster) = cmd.raster {
        cfg.raster = raster.into();
    }
    if let Some(points) = cmd.points {
        cfg.path_points = points;
    }
    if cmd.no_spectral {
        cfg.spectral = false;
    }
    SmoothJob {
        config: cfg,
        nodes_path: cmd.nodes.clone(),
        edges_path: cmd.edges.clone(),
        out_path: cmd.out.clone(),
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_generate_text(ui: &Ui, summary: &GenerateSummary) {
    let report = &summary.report;
    let edges = &report.wiring.edges;
    ui.section(
        "Network",
        [
            ("nodes", report.nodes.to_string()),
            ("clusters", report.clusters.to_string()),
            (
                "cluster sizes",
                format!("{}..={}", report.min_cluster_size, report.max_cluster_size),
            ),
            ("degree sum", report.wiring.degree_sum.to_string()),
            ("internal edges", edges.internal.to_string()),
            ("external edges", edges.external.to_string()),
        ],
    );
    if report.reconcile.used_fallback {
        ui.warn(&format!(
            "cluster sizes reconciled deterministically after {} random adjustments",
            report.reconcile.random_attempts
        ));
    }
    if edges.dropped_external > 0 {
        ui.warn(&format!(
            "{} external edges dropped: every node shares one cluster",
            edges.dropped_external
        ));
    }
    if let Some(fix) = report.wiring.parity_fix {
        ui.info(&format!("degree of node {} adjusted by {:+}", fix.node, fix.delta));
    }
    ui.success(&format!(
        "wrote {} and {} in {}",
        summary.nodes_path.display(),
        summary.edges_path.display(),
        format_duration(std::time::Duration::from_secs_f64(report.duration_ms / 1_000.0))
    ));
}

fn print_smooth_text(ui: &Ui, summary: &SmoothSummary) {
    let report = &summary.report;
    ui.section(
        "Density",
        [
            ("grid", format!("{0}x{0}x{0}", report.grid_size)),
            ("raster", format!("{:?}", report.strategy).to_lowercase()),
            ("voxel visits", report.raster.voxel_visits.to_string()),
            ("occupied voxels", report.density.nonzero.to_string()),
            ("peak density", format!("{}", report.density.max)),
        ],
    );
    if let Some(spectral) = &report.spectral {
        ui.section(
            "Spectral mask",
            [
                ("threshold", format!("{:.4}", spectral.mask.threshold)),
                ("kept", spectral.mask.kept.to_string()),
                ("zeroed", spectral.mask.zeroed.to_string()),
                (
                    "field range",
                    format!("{:.4}..{:.4}", spectral.field.min, spectral.field.max),
                ),
            ],
        );
    }
    if report.edges_skipped > 0 {
        ui.warn(&format!(
            "{} edges skipped: endpoint missing from the nodes table",
            report.edges_skipped
        ));
    }
    ui.success(&format!(
        "wrote {} rows to {} in {}",
        summary.rows_written,
        summary.out_path.display(),
        format_duration(std::time::Duration::from_secs_f64(report.duration_ms / 1_000.0))
    ));
}
