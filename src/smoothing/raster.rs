//! Segment rasterization into voxel paths.
//!
//! Two strategies share the [`SegmentRasterizer`] interface. [`SampledRasterizer`]
//! truncates a fixed number of evenly spaced samples and may skip or repeat voxels
//! on long segments. [`ExactRasterizer`] walks a 3D Bresenham line and visits every
//! voxel on the path exactly once.

use serde::{Deserialize, Serialize};

use super::grid::{GridMapping, Voxel};
use crate::model::Point3;

/// Rasterization strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterStrategy {
    /// Fixed number of evenly spaced samples per segment.
    #[default]
    Sampled,
    /// Gap-free integer line walk.
    Exact,
}

impl RasterStrategy {
    /// Builds the rasterizer for this strategy.
    pub fn rasterizer(self, samples: usize) -> Box<dyn SegmentRasterizer> {
        match self {
            RasterStrategy::Sampled => Box::new(SampledRasterizer::new(samples)),
            RasterStrategy::Exact => Box::new(ExactRasterizer),
        }
    }
}

/// Turns a grid-space segment into the sequence of voxels it visits.
pub trait SegmentRasterizer {
    /// Appends the voxels visited from `from` to `to` onto `out`, in path order.
    fn rasterize(&self, mapping: &GridMapping, from: Point3, to: Point3, out: &mut Vec<Voxel>);
}

/// Samples `samples` evenly spaced points, endpoints included, and truncates each
/// to the voxel containing it.
#[derive(Debug, Clone, Copy)]
pub struct SampledRasterizer {
    samples: usize,
}

impl SampledRasterizer {
    /// Creates a rasterizer taking `samples` points per segment; at least two.
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(2),
        }
    }
}

impl SegmentRasterizer for SampledRasterizer {
    fn rasterize(&self, mapping: &GridMapping, from: Point3, to: Point3, out: &mut Vec<Voxel>) {
        let steps = (self.samples - 1) as f64;
        for i in 0..self.samples {
            let point = from.lerp(to, i as f64 / steps);
            out.push(mapping.voxel(point));
        }
    }
}

/// 3D Bresenham walk between the voxels containing the two endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactRasterizer;

impl SegmentRasterizer for ExactRasterizer {
    fn rasterize(&self, mapping: &GridMapping, from: Point3, to: Point3, out: &mut Vec<Voxel>) {
        let start = mapping.voxel(from);
        let end = mapping.voxel(to);
        bresenham_3d(start, end, out);
    }
}

/// Appends every voxel on the integer line from `start` to `end`, both included.
///
/// The axis with the largest delta drives the walk one voxel per step; the two
/// minor axes step whenever their doubled-delta error term turns non-negative.
pub fn bresenham_3d(start: Voxel, end: Voxel, out: &mut Vec<Voxel>) {
    let p0 = start.map(|v| v as i64);
    let p1 = end.map(|v| v as i64);
    let delta = [
        (p1[0] - p0[0]).abs(),
        (p1[1] - p0[1]).abs(),
        (p1[2] - p0[2]).abs(),
    ];
    let step = [
        (p1[0] - p0[0]).signum(),
        (p1[1] - p0[1]).signum(),
        (p1[2] - p0[2]).signum(),
    ];

    let drive = if delta[0] >= delta[1] && delta[0] >= delta[2] {
        0
    } else if delta[1] >= delta[2] {
        1
    } else {
        2
    };
    let (minor_a, minor_b) = match drive {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };

    let mut cur = p0;
    let mut err_a = 2 * delta[minor_a] - delta[drive];
    let mut err_b = 2 * delta[minor_b] - delta[drive];
    out.reserve(delta[drive] as usize + 1);
    out.push(start);
    while cur[drive] != p1[drive] {
        cur[drive] += step[drive];
        if err_a >= 0 {
            cur[minor_a] += step[minor_a];
            err_a -= 2 * delta[drive];
        }
        if err_b >= 0 {
            cur[minor_b] += step[minor_b];
            err_b -= 2 * delta[drive];
        }
        err_a += 2 * delta[minor_a];
        err_b += 2 * delta[minor_b];
        out.push(cur.map(|v| v as usize));
    }
}
