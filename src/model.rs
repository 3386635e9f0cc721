//! Records shared by the generator and smoothing stages.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Identifier of a generated node. Ids are contiguous in cluster order.
pub type NodeId = u64;
/// Identifier of a cluster, equal to its position in the layout.
pub type ClusterId = usize;

/// A point in three-dimensional space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point3 {
    /// Creates a point from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation `(1 - t) * self + t * other`.
    pub fn lerp(self, other: Point3, t: f64) -> Point3 {
        let s = 1.0 - t;
        Point3 {
            x: s * self.x + t * other.x,
            y: s * self.y + t * other.y,
            z: s * self.z + t * other.z,
        }
    }

    /// Coordinates as an `[x, y, z]` array.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Applies `f` to every coordinate.
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Point3 {
        Point3 {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }
}

/// Closed coordinate interval `[min, max]` applied to every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            min: -100.0,
            max: 100.0,
        }
    }
}

impl Domain {
    /// Creates a domain. Callers validate `min < max` through config validation.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the interval.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamps a scalar into the interval.
    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Clamps every coordinate of a point into the interval.
    pub fn clip_point(&self, point: Point3) -> Point3 {
        point.map(|v| self.clip(v))
    }

    /// Returns true when every coordinate of `point` lies inside the interval.
    pub fn contains(&self, point: Point3) -> bool {
        point
            .to_array()
            .iter()
            .all(|v| *v >= self.min && *v <= self.max)
    }
}

/// A generated node with its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// Position inside the domain.
    pub pos: Point3,
}

/// A spatial cluster owning a contiguous range of node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster id.
    pub id: ClusterId,
    /// Center the member coordinates are sampled around.
    pub center: Point3,
    /// Contiguous member ids.
    pub members: Range<NodeId>,
}

/// A directed edge, emitted once from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
}

impl Edge {
    /// Creates an edge.
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

/// Interior points derived for a single edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedEdge {
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Points strictly between the endpoints, ordered from source to target.
    pub points: Vec<Point3>,
}
