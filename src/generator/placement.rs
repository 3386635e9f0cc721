use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::layout::ClusterLayout;
use super::GenerateError;
use crate::model::{Domain, Node, Point3};

/// Scatters each cluster's members around its center.
#[derive(Debug, Clone, Copy)]
pub struct NodePlacer {
    sigma: f64,
    domain: Domain,
}

impl NodePlacer {
    /// Creates a placer with per-axis deviation `sigma`, clipping into `domain`.
    pub fn new(sigma: f64, domain: Domain) -> Self {
        Self { sigma, domain }
    }

    /// Draws one node per layout slot. Ids follow cluster order, then draw order,
    /// so node `i` always falls inside `layout.members(layout.cluster_of(i))`.
    pub fn place<R: Rng + ?Sized>(
        &self,
        layout: &ClusterLayout,
        rng: &mut R,
    ) -> Result<Vec<Node>, GenerateError> {
        let jitter = Normal::new(0.0, self.sigma)
            .map_err(|err| GenerateError::Distribution(err.to_string()))?;
        let mut nodes = Vec::with_capacity(layout.total_nodes() as usize);
        for (cluster, center) in layout.centers().iter().enumerate() {
            for id in layout.members(cluster) {
                let raw = Point3::new(
                    center.x + jitter.sample(rng),
                    center.y + jitter.sample(rng),
                    center.z + jitter.sample(rng),
                );
                nodes.push(Node {
                    id,
                    pos: self.domain.clip_point(raw),
                });
            }
        }
        Ok(nodes)
    }
}
