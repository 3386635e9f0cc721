//! Gaussian pre-blur followed by an adaptive spectral mask.
//!
//! The blurred grid is transformed with a 3D DFT. Every component whose magnitude
//! is at or below the configured percentile of all magnitudes is zeroed, the
//! spectrum is inverted, and the real part is kept as the smoothed field.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::Serialize;

use super::grid::VoxelGrid;
use crate::config::SmoothingConfig;

/// Result of a smoothing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedField {
    /// Real part of the filtered inverse transform.
    pub field: VoxelGrid,
    /// Summary of the mask that produced it.
    pub mask: MaskSummary,
}

/// What the spectral mask removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaskSummary {
    /// Magnitude threshold; components at or below it were zeroed.
    pub threshold: f64,
    /// Components kept.
    pub kept: u64,
    /// Components zeroed.
    pub zeroed: u64,
}

/// Gaussian + spectral low-magnitude filter over a cubic grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralSmoother {
    blur_sigma: f64,
    blur_truncate: f64,
    percentile: f64,
}

impl SpectralSmoother {
    /// Creates a smoother. `blur_sigma == 0` disables the pre-blur.
    pub fn new(blur_sigma: f64, blur_truncate: f64, percentile: f64) -> Self {
        Self {
            blur_sigma,
            blur_truncate,
            percentile,
        }
    }

    /// Smoother parameters taken from a smoothing config.
    pub fn from_config(cfg: &SmoothingConfig) -> Self {
        Self::new(cfg.blur_sigma, cfg.blur_truncate, cfg.percentile)
    }

    /// Filters `grid`, consuming it.
    pub fn smooth(&self, mut grid: VoxelGrid) -> SmoothedField {
        let size = grid.size();
        if self.blur_sigma > 0.0 {
            gaussian_blur(&mut grid, self.blur_sigma, self.blur_truncate);
        }

        let mut spectrum: Vec<Complex<f64>> = grid
            .into_cells()
            .into_iter()
            .map(|re| Complex::new(re, 0.0))
            .collect();
        let mut fft = Fft3d::new(size);
        fft.forward(&mut spectrum);

        let mut magnitudes: Vec<f64> = spectrum.iter().map(|c| c.norm()).collect();
        let threshold = percentile(&mut magnitudes, self.percentile);
        let mut kept = 0u64;
        for component in spectrum.iter_mut() {
            if component.norm() > threshold {
                kept += 1;
            } else {
                *component = Complex::new(0.0, 0.0);
            }
        }
        let zeroed = spectrum.len() as u64 - kept;

        fft.inverse(&mut spectrum);
        let field = VoxelGrid::from_cells(size, spectrum.into_iter().map(|c| c.re).collect());
        SmoothedField {
            field,
            mask: MaskSummary {
                threshold,
                kept,
                zeroed,
            },
        }
    }
}

/// Normalized 1D Gaussian weights over `[-r, r]` with `r = round(truncate * sigma)`.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as i64;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Separable isotropic Gaussian blur with mirror-reflected borders (`d c b a | a b c d`).
pub fn gaussian_blur(grid: &mut VoxelGrid, sigma: f64, truncate: f64) {
    let kernel = gaussian_kernel(sigma, truncate);
    let size = grid.size();
    let radius = (kernel.len() / 2) as isize;
    let mut line = vec![0.0; size];
    let mut out = vec![0.0; size];
    for axis in 0..3 {
        let cells = grid.cells_mut();
        for_each_line(size, axis, |start, stride| {
            for (i, slot) in line.iter_mut().enumerate() {
                *slot = cells[start + i * stride];
            }
            for (i, slot) in out.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    let src = reflect(i as isize + k as isize - radius, size);
                    acc += w * line[src];
                }
                *slot = acc;
            }
            for (i, value) in out.iter().enumerate() {
                cells[start + i * stride] = *value;
            }
        });
    }
}

/// Value at `p` percent of the sorted values, interpolating linearly between ranks.
/// Reorders `values`. Returns 0 for an empty slice.
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

fn reflect(idx: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let m = idx.rem_euclid(period) as usize;
    if m < len {
        m
    } else {
        2 * len - 1 - m
    }
}

// Calls `f(start, stride)` for every 1D line of a cubic grid along `axis`.
fn for_each_line(size: usize, axis: usize, mut f: impl FnMut(usize, usize)) {
    let strides = [size * size, size, 1];
    let stride = strides[axis];
    let (outer, inner) = match axis {
        0 => (strides[1], strides[2]),
        1 => (strides[0], strides[2]),
        _ => (strides[0], strides[1]),
    };
    for a in 0..size {
        for b in 0..size {
            f(a * outer + b * inner, stride);
        }
    }
}

/// Unnormalized forward and normalized inverse 3D DFT over a cubic grid.
struct Fft3d {
    size: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    line: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl Fft3d {
    fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            size,
            forward,
            inverse,
            line: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    fn forward(&mut self, data: &mut [Complex<f64>]) {
        let plan = Arc::clone(&self.forward);
        self.transform(plan.as_ref(), data);
    }

    fn inverse(&mut self, data: &mut [Complex<f64>]) {
        let plan = Arc::clone(&self.inverse);
        self.transform(plan.as_ref(), data);
        let scale = 1.0 / data.len() as f64;
        for value in data.iter_mut() {
            *value *= scale;
        }
    }

    fn transform(&mut self, plan: &dyn Fft<f64>, data: &mut [Complex<f64>]) {
        let Self {
            size,
            line,
            scratch,
            ..
        } = self;
        for axis in 0..3 {
            for_each_line(*size, axis, |start, stride| {
                for (i, slot) in line.iter_mut().enumerate() {
                    *slot = data[start + i * stride];
                }
                plan.process_with_scratch(&mut line[..], &mut scratch[..]);
                for (i, value) in line.iter().enumerate() {
                    data[start + i * stride] = *value;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(size: usize, f: impl Fn(usize, usize, usize) -> f64) -> VoxelGrid {
        let mut cells = Vec::with_capacity(size * size * size);
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    cells.push(f(x, y, z));
                }
            }
        }
        VoxelGrid::from_cells(size, cells)
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0, 4.0);
        assert_eq!(kernel.len(), 17);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-15);
        }
        assert!(kernel[8] > kernel[7]);
    }

    #[test]
    fn reflect_mirrors_at_both_edges() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        // Radius wider than the grid keeps folding.
        assert_eq!(reflect(-7, 3), 0);
        assert_eq!(reflect(11, 3), 0);
    }

    #[test]
    fn blur_keeps_constant_fields_constant() {
        let mut grid = filled(6, |_, _, _| 2.5);
        gaussian_blur(&mut grid, 2.0, 4.0);
        assert!(grid.cells().iter().all(|v| (v - 2.5).abs() < 1e-12));
    }

    #[test]
    fn blur_spreads_an_interior_impulse_symmetrically() {
        let mut grid = VoxelGrid::zeros(21);
        grid.increment([10, 10, 10]);
        gaussian_blur(&mut grid, 1.0, 4.0);
        assert!((grid.total() - 1.0).abs() < 1e-12);
        let center = grid.get([10, 10, 10]);
        assert!(center < 1.0 && center > 0.0);
        assert!((grid.get([9, 10, 10]) - grid.get([11, 10, 10])).abs() < 1e-15);
        assert!((grid.get([10, 9, 10]) - grid.get([10, 10, 11])).abs() < 1e-15);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        assert_eq!(percentile(&mut [4.0, 1.0, 3.0, 2.0], 50.0), 2.5);
        let mut ramp: Vec<f64> = (0..=10).map(f64::from).collect();
        assert_eq!(percentile(&mut ramp, 90.0), 9.0);
        assert_eq!(percentile(&mut ramp, 0.0), 0.0);
        assert_eq!(percentile(&mut ramp, 100.0), 10.0);
        assert_eq!(percentile(&mut Vec::new(), 90.0), 0.0);
    }

    #[test]
    fn fft_round_trip_restores_input() {
        let grid = filled(5, |x, y, z| ((x * 7 + y * 3 + z) % 11) as f64);
        let mut data: Vec<Complex<f64>> =
            grid.cells().iter().map(|&re| Complex::new(re, 0.0)).collect();
        let mut fft = Fft3d::new(5);
        fft.forward(&mut data);
        // DC term holds the sum.
        assert!((data[0].re - grid.total()).abs() < 1e-9);
        fft.inverse(&mut data);
        for (a, b) in data.iter().zip(grid.cells()) {
            assert!((a.re - b).abs() < 1e-9);
            assert!(a.im.abs() < 1e-9);
        }
    }

    #[test]
    fn constant_field_survives_the_mask() {
        let smoother = SpectralSmoother::new(0.0, 4.0, 90.0);
        let out = smoother.smooth(filled(8, |_, _, _| 3.0));
        assert!(out.mask.kept >= 1);
        assert!(out.field.cells().iter().all(|v| (v - 3.0).abs() < 1e-9));
    }

    #[test]
    fn empty_grid_stays_empty() {
        let smoother = SpectralSmoother::new(2.0, 4.0, 90.0);
        let out = smoother.smooth(VoxelGrid::zeros(4));
        assert_eq!(out.mask.kept, 0);
        assert_eq!(out.mask.zeroed, 64);
        assert!(out.field.cells().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn mask_drops_at_least_the_percentile_share() {
        let grid = filled(8, |x, y, z| ((x * 31 + y * 17 + z * 5) % 13) as f64);
        let out = SpectralSmoother::new(1.0, 4.0, 90.0).smooth(grid);
        assert_eq!(out.mask.kept + out.mask.zeroed, 512);
        assert!(out.mask.kept <= 52);
        assert!(out.mask.threshold > 0.0);
    }

    #[test]
    fn smoothing_is_deterministic() {
        let grid = filled(6, |x, y, z| (x + 2 * y + 3 * z) as f64);
        let smoother = SpectralSmoother::new(2.0, 4.0, 90.0);
        assert_eq!(smoother.smooth(grid.clone()), smoother.smooth(grid));
    }
}
