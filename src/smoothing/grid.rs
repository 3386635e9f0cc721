use serde::Serialize;

use crate::model::{Domain, Point3};

/// Integer voxel coordinates `[x, y, z]`.
pub type Voxel = [usize; 3];

/// Affine map between the coordinate domain and grid space `[0, size - 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapping {
    domain: Domain,
    size: usize,
}

impl GridMapping {
    /// Maps `domain` onto a grid with `size` voxels per axis.
    pub fn new(domain: Domain, size: usize) -> Self {
        Self { domain, size }
    }

    /// `(coord - min) / span * (size - 1)` per axis.
    pub fn to_grid(&self, point: Point3) -> Point3 {
        let span = self.domain.span();
        let last = (self.size - 1) as f64;
        point.map(|v| (v - self.domain.min) / span * last)
    }

    /// Voxel containing a grid-space point, truncating each axis and clamping into
    /// the grid.
    pub fn voxel(&self, grid_point: Point3) -> Voxel {
        let max = (self.size - 1) as f64;
        let cell = |v: f64| v.clamp(0.0, max) as usize;
        [cell(grid_point.x), cell(grid_point.y), cell(grid_point.z)]
    }
}

/// Dense cubic field of values in row-major `[x][y][z]` order.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    size: usize,
    cells: Vec<f64>,
}

impl VoxelGrid {
    /// Allocates a zeroed grid with `size` voxels per axis.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size * size * size],
        }
    }

    /// Wraps row-major cells.
    ///
    /// # Panics
    /// Panics if `cells.len() != size³`.
    pub fn from_cells(size: usize, cells: Vec<f64>) -> Self {
        assert_eq!(cells.len(), size * size * size, "grid cell count");
        Self { size, cells }
    }

    /// Voxels per axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Flat cell values.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.cells
    }

    pub(crate) fn into_cells(self) -> Vec<f64> {
        self.cells
    }

    /// Flat index of a voxel.
    pub fn index(&self, [x, y, z]: Voxel) -> usize {
        (x * self.size + y) * self.size + z
    }

    /// Value at a voxel.
    pub fn get(&self, voxel: Voxel) -> f64 {
        self.cells[self.index(voxel)]
    }

    /// Adds one to a voxel. The grid is only ever mutated additively.
    pub fn increment(&mut self, voxel: Voxel) {
        let idx = self.index(voxel);
        self.cells[idx] += 1.0;
    }

    /// Sum over all cells.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Min, max, mean and non-zero count.
    pub fn stats(&self) -> GridStats {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut nonzero = 0u64;
        for &value in &self.cells {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            if value != 0.0 {
                nonzero += 1;
            }
        }
        GridStats {
            min,
            max,
            mean: sum / self.cells.len() as f64,
            nonzero,
        }
    }
}

/// Summary statistics of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStats {
    /// Smallest cell value.
    pub min: f64,
    /// Largest cell value.
    pub max: f64,
    /// Mean cell value.
    pub mean: f64,
    /// Cells that are not exactly zero.
    pub nonzero: u64,
}
