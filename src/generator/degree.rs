//! Bounded power-law out-degree budgets.

use rand::Rng;
use serde::Serialize;

use crate::model::NodeId;

/// Which node the parity fix touched and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParityFix {
    /// Adjusted node.
    pub node: NodeId,
    /// `+1` or `-1`.
    pub delta: i8,
}

/// Per-node target out-degrees, indexed by node id. The sum is even once
/// [`DegreeSampler::sample`] returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DegreeSequence(Vec<u32>);

impl DegreeSequence {
    /// Wraps raw degrees without checking parity.
    pub fn from_vec(degrees: Vec<u32>) -> Self {
        Self(degrees)
    }

    /// Degrees in node order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no node is covered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all degrees.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&k| k as u64).sum()
    }
}

/// Inverse-CDF sampler for `k = k_min * (1 - u)^(-1 / (gamma - 1))`, rounded and
/// clipped into `[k_min, k_max]`.
#[derive(Debug, Clone, Copy)]
pub struct DegreeSampler {
    k_min: u32,
    k_max: u32,
    exponent: f64,
}

impl DegreeSampler {
    /// Creates a sampler. `gamma` must exceed 1 and `k_min <= k_max`.
    pub fn new(k_min: u32, k_max: u32, gamma: f64) -> Self {
        Self {
            k_min,
            k_max,
            exponent: -1.0 / (gamma - 1.0),
        }
    }

    /// Maps one uniform draw in `[0, 1)` to a degree.
    pub fn degree_for(&self, u: f64) -> u32 {
        let k = self.k_min as f64 * (1.0 - u).powf(self.exponent);
        k.round().clamp(self.k_min as f64, self.k_max as f64) as u32
    }

    /// Draws `count` degrees and fixes the parity of their sum.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> (DegreeSequence, Option<ParityFix>) {
        let mut degrees: Vec<u32> = (0..count).map(|_| self.degree_for(rng.gen())).collect();
        let fix = self.fix_parity(&mut degrees, rng);
        (DegreeSequence(degrees), fix)
    }

    /// Makes the sum even by moving one random node by one unit: up when it is
    /// below `k_max`, otherwise down. The downward step is taken even when it
    /// leaves the node below `k_min`.
    pub fn fix_parity<R: Rng + ?Sized>(
        &self,
        degrees: &mut [u32],
        rng: &mut R,
    ) -> Option<ParityFix> {
        let total: u64 = degrees.iter().map(|&k| k as u64).sum();
        if total % 2 == 0 || degrees.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..degrees.len());
        let delta = if degrees[idx] < self.k_max {
            degrees[idx] += 1;
            1
        } else {
            degrees[idx] -= 1;
            -1
        };
        Some(ParityFix {
            node: idx as NodeId,
            delta,
        })
    }
}
