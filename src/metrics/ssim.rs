//! Windowed structural similarity (SSIM).
//!
//! Uniform 7x7 windows with sample (N-1) covariance normalisation and the usual
//! `K1 = 0.01`, `K2 = 0.03` stabilisers. Only windows that lie fully inside the
//! grid contribute to the mean. A vector of length `n` is treated as a `1 x n`
//! grid, and an axis shorter than the window shrinks the window on that axis to
//! the largest odd size that fits.
//!
//! The data range is `max(max(reference), max(candidate))`.

use super::error::max_value;
use crate::errors::{MetricError, MetricResult};
use crate::series::{Execution, Shape};

const WINDOW: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// SSIM between two executions of identical shape.
pub fn structural_similarity(reference: &Execution, candidate: &Execution) -> MetricResult<f64> {
    if reference.shape() != candidate.shape() {
        return Err(MetricError::ShapeMismatch {
            reference: reference.shape(),
            candidate: candidate.shape(),
        });
    }
    let (rows, cols) = match reference.shape() {
        Shape::Vector(len) => (1, len),
        Shape::Matrix { rows, cols } => (rows, cols),
    };
    ssim_grid(reference.values(), candidate.values(), rows, cols)
}

fn window_extent(dim: usize) -> usize {
    let extent = dim.min(WINDOW);
    if extent % 2 == 0 { extent - 1 } else { extent }
}

/// SSIM over row-major `rows x cols` grids.
pub(crate) fn ssim_grid(
    reference: &[f64],
    candidate: &[f64],
    rows: usize,
    cols: usize,
) -> MetricResult<f64> {
    if rows == 0 || cols == 0 {
        return Err(MetricError::EmptyInput { metric: "SSIM" });
    }

    let data_range = max_value(reference).max(max_value(candidate));
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let win_rows = window_extent(rows);
    let win_cols = window_extent(cols);
    let np = (win_rows * win_cols) as f64;
    let cov_norm = if np > 1.0 { np / (np - 1.0) } else { 1.0 };

    let mut total = 0.0;
    let mut windows = 0usize;
    for top in 0..=(rows - win_rows) {
        for left in 0..=(cols - win_cols) {
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            let mut sum_xx = 0.0;
            let mut sum_yy = 0.0;
            let mut sum_xy = 0.0;
            for r in top..top + win_rows {
                let offset = r * cols;
                for c in left..left + win_cols {
                    let x = reference[offset + c];
                    let y = candidate[offset + c];
                    sum_x += x;
                    sum_y += y;
                    sum_xx += x * x;
                    sum_yy += y * y;
                    sum_xy += x * y;
                }
            }

            let ux = sum_x / np;
            let uy = sum_y / np;
            let vx = cov_norm * (sum_xx / np - ux * ux);
            let vy = cov_norm * (sum_yy / np - uy * uy);
            let vxy = cov_norm * (sum_xy / np - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += if denominator == 0.0 {
                1.0
            } else {
                numerator / denominator
            };
            windows += 1;
        }
    }

    Ok(total / windows as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Matrix;

    const DELTA: f64 = 1e-9;

    fn gradient(rows: usize, cols: usize) -> Execution {
        let data = (0..rows * cols).map(|i| i as f64).collect();
        Execution::Matrix(Matrix::from_row_major(rows, cols, data).unwrap())
    }

    #[test]
    fn test_identical_grids_score_one() {
        let grid = gradient(9, 9);
        assert!((structural_similarity(&grid, &grid).unwrap() - 1.0).abs() < DELTA);
    }

    #[test]
    fn test_all_zero_grids_score_one() {
        let zeros = Execution::Matrix(Matrix::zeros(8, 8));
        assert_eq!(structural_similarity(&zeros, &zeros).unwrap(), 1.0);
    }

    #[test]
    fn test_noise_lowers_score() {
        let grid = gradient(10, 10);
        let noisy_data: Vec<f64> = grid
            .values()
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v + 15.0 } else { v - 15.0 })
            .collect();
        let noisy = Execution::Matrix(Matrix::from_row_major(10, 10, noisy_data).unwrap());
        let score = structural_similarity(&grid, &noisy).unwrap();
        assert!(score < 0.99);
        assert!(score > -1.0);
    }

    #[test]
    fn test_vectors_use_single_row_window() {
        let a = Execution::Vector((0..20).map(|i| (i as f64).sin()).collect());
        assert!((structural_similarity(&a, &a).unwrap() - 1.0).abs() < DELTA);
        assert_eq!(window_extent(1), 1);
        assert_eq!(window_extent(4), 3);
        assert_eq!(window_extent(100), 7);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let a = gradient(3, 4);
        let b = gradient(4, 3);
        assert!(matches!(
            structural_similarity(&a, &b),
            Err(MetricError::ShapeMismatch { .. })
        ));
    }
}
