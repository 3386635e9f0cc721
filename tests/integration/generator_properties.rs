#![allow(missing_docs)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use voxgraph::generator::layout::reconcile_sizes;
use voxgraph::generator::{DegreeSampler, NetworkGenerator};
use voxgraph::{Edge, GeneratorConfig};

fn config_strategy() -> impl Strategy<Value = GeneratorConfig> {
    (
        2u64..400,
        1usize..20,
        0.0f64..60.0,
        1.2f64..4.0,
        1u32..4,
        0u32..8,
        any::<u64>(),
        any::<u64>(),
    )
        .prop_map(|(nodes, clusters, std, gamma, k_min, spread, layout_seed, wiring_seed)| {
            GeneratorConfig {
                num_nodes: nodes,
                num_clusters: clusters.min(nodes as usize),
                cluster_size_std: std,
                gamma,
                k_min,
                k_max: k_min + spread,
                layout_seed,
                wiring_seed: Some(wiring_seed),
                ..GeneratorConfig::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn layout_partitions_every_node(cfg in config_strategy()) {
        let generator = NetworkGenerator::new(&cfg).expect("valid config");
        let placed = generator.place().expect("place");
        let sizes = placed.layout.sizes();
        prop_assert_eq!(sizes.len(), cfg.num_clusters);
        prop_assert!(sizes.iter().all(|&s| s >= 1));
        prop_assert_eq!(sizes.iter().sum::<u64>(), cfg.num_nodes);

        prop_assert_eq!(placed.nodes.len() as u64, cfg.num_nodes);
        for (i, node) in placed.nodes.iter().enumerate() {
            prop_assert_eq!(node.id, i as u64);
            prop_assert!(cfg.domain.contains(node.pos));
        }
        let mut next = 0;
        for cluster in placed.clusters() {
            prop_assert_eq!(cluster.members.start, next);
            prop_assert!(cfg.domain.contains(cluster.center));
            next = cluster.members.end;
        }
        prop_assert_eq!(next, cfg.num_nodes);
    }

    #[test]
    fn wiring_respects_degree_budgets(cfg in config_strategy()) {
        let generator = NetworkGenerator::new(&cfg).expect("valid config");
        let placed = generator.place().expect("place");
        let mut edges: Vec<Edge> = Vec::new();
        let report = generator
            .wire(&placed, &mut generator.wiring_rng(), &mut edges)
            .expect("wire");

        prop_assert_eq!(report.degree_sum % 2, 0);
        prop_assert_eq!(
            report.edges.total() + report.edges.dropped_external,
            report.degree_sum
        );
        prop_assert_eq!(edges.len() as u64, report.edges.total());

        let layout = &placed.layout;
        let mut internal = 0;
        for edge in &edges {
            prop_assert_ne!(edge.source, edge.target);
            prop_assert!(edge.target < cfg.num_nodes);
            if layout.cluster_of(edge.source) == layout.cluster_of(edge.target) {
                internal += 1;
            }
        }
        prop_assert_eq!(internal, report.edges.internal);
    }

    #[test]
    fn degrees_stay_within_bounds_except_parity_step(
        k_min in 1u32..5,
        spread in 0u32..20,
        gamma in 1.1f64..5.0,
        count in 1usize..500,
        seed in any::<u64>(),
    ) {
        let k_max = k_min + spread;
        let sampler = DegreeSampler::new(k_min, k_max, gamma);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (degrees, fix) = sampler.sample(count, &mut rng);
        prop_assert_eq!(degrees.total() % 2, 0);
        for (node, &k) in degrees.as_slice().iter().enumerate() {
            let lower = match fix {
                Some(fix) if fix.node == node as u64 && fix.delta < 0 => k_min - 1,
                _ => k_min,
            };
            prop_assert!(k >= lower && k <= k_max, "node {} has degree {}", node, k);
        }
    }

    #[test]
    fn reconciliation_hits_target_with_or_without_fallback(
        sizes in prop::collection::vec(1u64..200, 1..30),
        extra in 0u64..500,
        limit in 0u64..50,
        seed in any::<u64>(),
    ) {
        let target = sizes.len() as u64 + extra;
        let mut sizes = sizes;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let report = reconcile_sizes(&mut sizes, target, limit, &mut rng).expect("feasible");
        prop_assert_eq!(sizes.iter().sum::<u64>(), target);
        prop_assert!(sizes.iter().all(|&s| s >= 1));
        prop_assert!(report.random_attempts <= limit);
    }
}

#[test]
fn same_layout_seed_yields_identical_node_table() {
    let cfg = GeneratorConfig {
        num_nodes: 1_000,
        num_clusters: 10,
        cluster_size_std: 20.0,
        wiring_seed: None,
        ..GeneratorConfig::default()
    };
    let a = NetworkGenerator::new(&cfg).expect("config").place().expect("a");
    let b = NetworkGenerator::new(&cfg).expect("config").place().expect("b");
    assert_eq!(a.nodes, b.nodes);

    let other = GeneratorConfig {
        layout_seed: 7,
        ..cfg
    };
    let c = NetworkGenerator::new(&other).expect("config").place().expect("c");
    assert_ne!(a.nodes, c.nodes);
}

#[test]
fn default_sized_network_generates() {
    let cfg = GeneratorConfig {
        wiring_seed: Some(1),
        ..GeneratorConfig::default()
    };
    let generator = NetworkGenerator::new(&cfg).expect("config");
    let (report, edges) = generator.run(|_| Ok(Vec::<Edge>::new())).expect("run");
    assert_eq!(report.nodes, 10_000);
    assert_eq!(report.clusters, 100);
    assert_eq!(edges.len() as u64, report.wiring.edges.total());
    assert_eq!(report.wiring.edges.dropped_external, 0);
}
