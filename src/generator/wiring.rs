//! Stochastic edge wiring.
//!
//! Each node spends its degree budget on internal edges first, up to the number of
//! other members in its cluster, and sends the rest to nodes outside the cluster.
//! Both pools are sampled uniformly with replacement in O(1) by index arithmetic
//! over the contiguous cluster ranges.

use std::io;

use rand::Rng;
use serde::Serialize;

use super::degree::DegreeSequence;
use super::layout::ClusterLayout;
use super::GenerateError;
use crate::model::{Edge, NodeId};

/// Destination for edges as they are drawn.
pub trait EdgeSink {
    /// Accepts one edge.
    fn push(&mut self, edge: Edge) -> io::Result<()>;
}

impl EdgeSink for Vec<Edge> {
    fn push(&mut self, edge: Edge) -> io::Result<()> {
        Vec::push(self, edge);
        Ok(())
    }
}

/// Edge counts produced by a wiring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WiringStats {
    /// Edges whose target shares the source's cluster.
    pub internal: u64,
    /// Edges whose target lies in another cluster.
    pub external: u64,
    /// External draws dropped because the layout has a single cluster.
    pub dropped_external: u64,
}

impl WiringStats {
    /// Edges emitted.
    pub fn total(&self) -> u64 {
        self.internal + self.external
    }
}

/// Draws edges for nodes of a fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct EdgeWirer<'a> {
    layout: &'a ClusterLayout,
}

impl<'a> EdgeWirer<'a> {
    /// Creates a wirer over `layout`.
    pub fn new(layout: &'a ClusterLayout) -> Self {
        Self { layout }
    }

    /// Wires every node in id order. `degrees` must hold one entry per node.
    pub fn wire_all<R, S>(
        &self,
        degrees: &DegreeSequence,
        rng: &mut R,
        sink: &mut S,
    ) -> Result<WiringStats, GenerateError>
    where
        R: Rng + ?Sized,
        S: EdgeSink + ?Sized,
    {
        let mut stats = WiringStats::default();
        for (node, &degree) in degrees.as_slice().iter().enumerate() {
            self.wire_node(node as NodeId, degree, rng, sink, &mut stats)?;
        }
        Ok(stats)
    }

    /// Emits up to `degree` edges out of `node`.
    pub fn wire_node<R, S>(
        &self,
        node: NodeId,
        degree: u32,
        rng: &mut R,
        sink: &mut S,
        stats: &mut WiringStats,
    ) -> Result<(), GenerateError>
    where
        R: Rng + ?Sized,
        S: EdgeSink + ?Sized,
    {
        let cluster = self
            .layout
            .cluster_of(node)
            .ok_or(GenerateError::NodeOutsideLayout {
                node,
                nodes: self.layout.total_nodes(),
            })?;
        let members = self.layout.members(cluster);
        let size = members.end - members.start;
        let k_in = (degree as u64).min(size - 1);
        let k_out = degree as u64 - k_in;

        for _ in 0..k_in {
            // Skip over `node` itself by shifting draws at or above it.
            let mut target = members.start + rng.gen_range(0..size - 1);
            if target >= node {
                target += 1;
            }
            sink.push(Edge::new(node, target))?;
            stats.internal += 1;
        }

        let outside = self.layout.total_nodes() - size;
        if outside == 0 {
            stats.dropped_external += k_out;
            return Ok(());
        }
        for _ in 0..k_out {
            // Draws past the home range start are shifted over it.
            let mut target = rng.gen_range(0..outside);
            if target >= members.start {
                target += size;
            }
            sink.push(Edge::new(node, target))?;
            stats.external += 1;
        }
        Ok(())
    }
}
