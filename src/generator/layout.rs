//! Cluster sizes and centers.
//!
//! Sizes are drawn from a normal distribution around `Nn / Nc`, rounded and
//! clipped to at least one member, then reconciled so they sum to `Nn` exactly.
//! Reconciliation first nudges random clusters one unit at a time; if that has
//! not converged after `attempt_limit` draws, a largest-remainder rescale
//! finishes the job deterministically.

use std::ops::Range;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::{debug, warn};

use super::GenerateError;
use crate::config::GeneratorConfig;
use crate::model::{Cluster, ClusterId, Domain, NodeId, Point3};

/// How the sampled sizes were brought to the exact node total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Sum of the rounded, clipped samples before reconciliation.
    pub initial_total: u64,
    /// Random draws spent in the unit-step phase.
    pub random_attempts: u64,
    /// Whether the largest-remainder fallback was needed.
    pub used_fallback: bool,
}

/// Cluster sizes, centers and the prefix sums that map ids to clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayout {
    sizes: Vec<u64>,
    centers: Vec<Point3>,
    // offsets[c]..offsets[c + 1] are the member ids of cluster c.
    offsets: Vec<NodeId>,
    reconcile: ReconcileReport,
}

impl ClusterLayout {
    /// Samples a layout for `cfg` from `rng`.
    pub fn generate<R: Rng + ?Sized>(
        cfg: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Self, GenerateError> {
        let total = cfg.num_nodes;
        let count = cfg.num_clusters;
        if count == 0 || (count as u64) > total {
            return Err(GenerateError::InfeasibleLayout {
                nodes: total,
                clusters: count,
            });
        }

        let normal = Normal::new(cfg.mean_cluster_size(), cfg.cluster_size_std)
            .map_err(|err| GenerateError::Distribution(err.to_string()))?;
        // No single cluster can hold more than every node.
        let mut sizes: Vec<u64> = (0..count)
            .map(|_| normal.sample(rng).round().clamp(1.0, total as f64) as u64)
            .collect();

        let reconcile = reconcile_sizes(&mut sizes, total, cfg.reconcile_attempt_limit, rng)?;
        let centers = sample_centers(count, &cfg.domain, rng);
        Ok(Self::from_parts(sizes, centers, reconcile))
    }

    /// Builds a layout from explicit sizes and centers.
    ///
    /// # Panics
    /// Panics if the two vectors differ in length.
    pub fn from_parts(sizes: Vec<u64>, centers: Vec<Point3>, reconcile: ReconcileReport) -> Self {
        assert_eq!(sizes.len(), centers.len(), "one center per cluster");
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        let mut acc = 0;
        offsets.push(acc);
        for size in &sizes {
            acc += size;
            offsets.push(acc);
        }
        Self {
            sizes,
            centers,
            offsets,
            reconcile,
        }
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true when the layout has no clusters.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Total number of nodes across all clusters.
    pub fn total_nodes(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Member counts, in cluster order.
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Cluster centers, in cluster order.
    pub fn centers(&self) -> &[Point3] {
        &self.centers
    }

    /// Reconciliation summary.
    pub fn reconcile(&self) -> &ReconcileReport {
        &self.reconcile
    }

    /// Contiguous member ids of `cluster`.
    pub fn members(&self, cluster: ClusterId) -> Range<NodeId> {
        self.offsets[cluster]..self.offsets[cluster + 1]
    }

    /// Cluster owning `node`, or `None` if the id is out of range.
    pub fn cluster_of(&self, node: NodeId) -> Option<ClusterId> {
        if node >= self.total_nodes() {
            return None;
        }
        // First offset strictly greater than `node` closes the owning cluster.
        Some(self.offsets.partition_point(|&start| start <= node) - 1)
    }

    /// Materializes the layout as [`Cluster`] records.
    pub fn clusters(&self) -> Vec<Cluster> {
        (0..self.len())
            .map(|id| Cluster {
                id,
                center: self.centers[id],
                members: self.members(id),
            })
            .collect()
    }
}

/// Adjusts `sizes` in place until they sum to `target`, keeping every entry at least one.
pub fn reconcile_sizes<R: Rng + ?Sized>(
    sizes: &mut [u64],
    target: u64,
    attempt_limit: u64,
    rng: &mut R,
) -> Result<ReconcileReport, GenerateError> {
    let count = sizes.len();
    if count == 0 || (count as u64) > target {
        return Err(GenerateError::InfeasibleLayout {
            nodes: target,
            clusters: count,
        });
    }

    let initial_total: u128 = sizes.iter().map(|&s| s as u128).sum();
    let target_wide = target as u128;
    let mut total = initial_total;
    let mut attempts = 0u64;
    while total != target_wide && attempts < attempt_limit {
        attempts += 1;
        let idx = rng.gen_range(0..count);
        if total < target_wide {
            sizes[idx] += 1;
            total += 1;
        } else if sizes[idx] > 1 {
            sizes[idx] -= 1;
            total -= 1;
        }
    }

    let used_fallback = total != target_wide;
    if used_fallback {
        warn!(
            clusters = count,
            target,
            remaining = u64::try_from(total.abs_diff(target_wide)).unwrap_or(u64::MAX),
            attempts,
            "generate.layout.reconcile_fallback"
        );
        largest_remainder(sizes, target);
    }
    let initial_total = u64::try_from(initial_total).unwrap_or(u64::MAX);
    debug!(
        initial_total,
        target, attempts, used_fallback, "generate.layout.reconciled"
    );
    Ok(ReconcileReport {
        initial_total,
        random_attempts: attempts,
        used_fallback,
    })
}

/// Rescales the surplus above one member per cluster so the sizes sum to `target`.
///
/// Each cluster keeps its guaranteed member and receives a share of the remaining
/// `target - len` nodes proportional to its current surplus. Integer shares are
/// floored and the leftover units go to the largest remainders, ties to the lower
/// index. Requires `target >= sizes.len()`.
pub(crate) fn largest_remainder(sizes: &mut [u64], target: u64) {
    let count = sizes.len() as u64;
    let extra = (target - count) as u128;
    let weights: Vec<u128> = if sizes.iter().all(|&s| s <= 1) {
        vec![1; sizes.len()]
    } else {
        sizes.iter().map(|&s| s.saturating_sub(1) as u128).collect()
    };
    let weight_total: u128 = weights.iter().sum();

    let mut remainders = Vec::with_capacity(sizes.len());
    let mut assigned = 0u128;
    for (idx, weight) in weights.iter().enumerate() {
        let share = extra * weight;
        let base = share / weight_total;
        sizes[idx] = 1 + base as u64;
        assigned += base;
        remainders.push((share % weight_total, idx));
    }
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, idx) in remainders.iter().take((extra - assigned) as usize) {
        sizes[idx] += 1;
    }
}

fn sample_centers<R: Rng + ?Sized>(count: usize, domain: &Domain, rng: &mut R) -> Vec<Point3> {
    (0..count)
        .map(|_| {
            Point3::new(
                rng.gen_range(domain.min..domain.max),
                rng.gen_range(domain.min..domain.max),
                rng.gen_range(domain.min..domain.max),
            )
        })
        .collect()
}
