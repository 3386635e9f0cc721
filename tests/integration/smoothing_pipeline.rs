#![allow(missing_docs)]

use proptest::prelude::*;
use voxgraph::generator::NetworkGenerator;
use voxgraph::smoothing::{bresenham_3d, SpectralSmoother, Voxel, VoxelGrid};
use voxgraph::{
    Edge, GeneratorConfig, Node, Point3, RasterStrategy, SmoothingConfig, SmoothingPipeline,
};

fn voxel_strategy(size: usize) -> impl Strategy<Value = Voxel> {
    [0..size, 0..size, 0..size]
}

fn chebyshev(a: Voxel, b: Voxel) -> usize {
    (0..3).map(|axis| a[axis].abs_diff(b[axis])).max().unwrap_or(0)
}

fn network(nodes: u64, clusters: usize) -> (Vec<Node>, Vec<Edge>) {
    let generator = NetworkGenerator::new(&GeneratorConfig {
        num_nodes: nodes,
        num_clusters: clusters,
        cluster_size_std: 5.0,
        wiring_seed: Some(99),
        ..GeneratorConfig::default()
    })
    .expect("config");
    let mut placed = None;
    let (_, edges) = generator
        .run(|network| {
            placed = Some(network.nodes.clone());
            Ok(Vec::<Edge>::new())
        })
        .expect("generate");
    (placed.expect("nodes handed over"), edges)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn exact_walk_is_gap_free(start in voxel_strategy(128), end in voxel_strategy(128)) {
        let mut path = Vec::new();
        bresenham_3d(start, end, &mut path);
        prop_assert_eq!(path.first().copied(), Some(start));
        prop_assert_eq!(path.last().copied(), Some(end));
        prop_assert_eq!(path.len(), chebyshev(start, end) + 1);
        for pair in path.windows(2) {
            prop_assert_eq!(chebyshev(pair[0], pair[1]), 1);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn mask_zeroes_at_least_the_percentile_share(
        cells in prop::collection::vec(0u8..6, 512),
        p in 0.0f64..100.0,
    ) {
        let grid = VoxelGrid::from_cells(8, cells.into_iter().map(f64::from).collect());
        let smoothed = SpectralSmoother::new(1.0, 4.0, p).smooth(grid);
        let n = 512u64;
        prop_assert_eq!(smoothed.mask.kept + smoothed.mask.zeroed, n);
        let at_or_below = ((p / 100.0) * (n - 1) as f64).floor() as u64 + 1;
        prop_assert!(smoothed.mask.zeroed >= at_or_below);
    }
}

#[test]
fn interior_points_divide_the_segment_evenly() {
    let pipeline = SmoothingPipeline::new(&SmoothingConfig::default()).expect("config");
    let nodes = [
        Node {
            id: 0,
            pos: Point3::new(0.0, 0.0, 0.0),
        },
        Node {
            id: 1,
            pos: Point3::new(10.0, 0.0, 0.0),
        },
    ];
    let output = pipeline.run(&nodes, &[Edge::new(0, 1)]);
    assert_eq!(output.edges.len(), 1);
    let edge = &output.edges[0];
    assert_eq!((edge.source, edge.target), (0, 1));
    let xs: Vec<f64> = edge.points.iter().map(|p| p.x).collect();
    let expected: Vec<f64> = (1..=8).map(|i| 10.0 * i as f64 / 9.0).collect();
    for (x, want) in xs.iter().zip(&expected) {
        assert!((x - want).abs() < 1e-9, "{x} vs {want}");
    }
    assert!(edge.points.iter().all(|p| p.y == 0.0 && p.z == 0.0));
}

#[test]
fn exact_raster_visits_every_voxel_on_each_path() {
    let (nodes, edges) = network(300, 6);
    let cfg = SmoothingConfig {
        grid_size: 48,
        raster: RasterStrategy::Exact,
        ..SmoothingConfig::default()
    };
    let pipeline = SmoothingPipeline::new(&cfg).expect("config");
    let mapping = *pipeline.mapping();
    let by_id: std::collections::HashMap<u64, Point3> =
        nodes.iter().map(|n| (n.id, n.pos)).collect();
    let expected: u64 = edges
        .iter()
        .map(|e| {
            let a = mapping.voxel(mapping.to_grid(by_id[&e.source]));
            let b = mapping.voxel(mapping.to_grid(by_id[&e.target]));
            chebyshev(a, b) as u64 + 1
        })
        .sum();

    let output = pipeline.run(&nodes, &edges);
    assert_eq!(output.report.raster.voxel_visits, expected);
    assert_eq!(output.report.edges_smoothed, edges.len() as u64);
    assert!(output.report.spectral.is_some());
}

#[test]
fn sampled_raster_adds_fixed_visits_per_edge() {
    let (nodes, edges) = network(200, 4);
    let pipeline = SmoothingPipeline::new(&SmoothingConfig {
        grid_size: 32,
        ..SmoothingConfig::default()
    })
    .expect("config");
    let output = pipeline.run(&nodes, &edges);
    assert_eq!(output.report.raster.voxel_visits, 10 * edges.len() as u64);
}

#[test]
fn smoothing_is_deterministic() {
    let (nodes, edges) = network(250, 5);
    let cfg = SmoothingConfig {
        grid_size: 24,
        ..SmoothingConfig::default()
    };
    let first = SmoothingPipeline::new(&cfg).expect("config").run(&nodes, &edges);
    let second = SmoothingPipeline::new(&cfg).expect("config").run(&nodes, &edges);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.report.raster, second.report.raster);
    assert_eq!(first.report.spectral, second.report.spectral);
}
