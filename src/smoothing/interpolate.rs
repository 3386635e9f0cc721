use crate::model::{Point3, SmoothedEdge};

/// Generates evenly parameterized interior points along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathInterpolator {
    points: usize,
}

impl PathInterpolator {
    /// Interpolator emitting `points` interior points per edge.
    pub fn new(points: usize) -> Self {
        Self { points }
    }

    /// Points at `t = (i + 1) / (N + 1)` for `i` in `0..N`, so neither endpoint is
    /// ever emitted.
    pub fn interior(&self, source: Point3, target: Point3) -> Vec<Point3> {
        let denom = (self.points + 1) as f64;
        (0..self.points)
            .map(|i| source.lerp(target, (i + 1) as f64 / denom))
            .collect()
    }

    /// Builds the smoothed record for one edge.
    pub fn smooth_edge(
        &self,
        source_id: u64,
        source: Point3,
        target_id: u64,
        target: Point3,
    ) -> SmoothedEdge {
        SmoothedEdge {
            source: source_id,
            target: target_id,
            points: self.interior(source, target),
        }
    }
}
