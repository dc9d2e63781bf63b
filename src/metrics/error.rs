//! Error-magnitude metrics: MSE, NRMSE and PSNR.
//!
//! All functions take two flat slices of equal length. Matrices are compared
//! through their row-major storage.

use crate::errors::{MetricError, MetricResult};
use crate::series::Shape;
use serde::{Deserialize, Serialize};

/// Peak signal value used by [`psnr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakSignal {
    /// Samples are known 8-bit values; the peak is 255.
    EightBit,
    /// The peak is the largest reference value.
    ReferenceMax,
}

impl PeakSignal {
    pub fn peak(&self, reference: &[f64]) -> f64 {
        match self {
            PeakSignal::EightBit => 255.0,
            PeakSignal::ReferenceMax => max_value(reference),
        }
    }
}

/// Fails with `ShapeMismatch` when the slices differ in length.
pub(crate) fn check_lengths(reference: &[f64], candidate: &[f64]) -> MetricResult<()> {
    if reference.len() != candidate.len() {
        return Err(MetricError::ShapeMismatch {
            reference: Shape::Vector(reference.len()),
            candidate: Shape::Vector(candidate.len()),
        });
    }
    Ok(())
}

pub(crate) fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn min_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Mean squared error.
///
/// Computes: MSE = (1/n) * Σ(refᵢ - candᵢ)²
pub fn mse(reference: &[f64], candidate: &[f64]) -> MetricResult<f64> {
    check_lengths(reference, candidate)?;
    if reference.is_empty() {
        return Err(MetricError::EmptyInput { metric: "MSE" });
    }

    let sum_squared_diff: f64 = reference
        .iter()
        .zip(candidate.iter())
        .map(|(r, c)| {
            let diff = r - c;
            diff * diff
        })
        .sum();

    Ok(sum_squared_diff / reference.len() as f64)
}

/// Root mean squared error normalised by the reference range.
///
/// Returns exactly `0.0` when the reference is constant.
pub fn nrmse(reference: &[f64], candidate: &[f64]) -> MetricResult<f64> {
    let rmse = mse(reference, candidate)?.sqrt();
    let range = max_value(reference) - min_value(reference);
    if range == 0.0 {
        return Ok(0.0);
    }
    Ok(rmse / range)
}

/// Peak signal-to-noise ratio in decibels. Identical inputs yield `+inf`.
pub fn psnr(reference: &[f64], candidate: &[f64], peak: PeakSignal) -> MetricResult<f64> {
    let error = mse(reference, candidate)?;
    if error == 0.0 {
        return Ok(f64::INFINITY);
    }
    let peak = peak.peak(reference);
    Ok(10.0 * (peak * peak / error).log10())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f64 = 1e-12;

    #[test]
    fn test_mse_of_identical_is_zero() {
        let a = [1.0, -2.0, 3.5];
        assert_eq!(mse(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_mse_constant_offset() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.5, 2.5, 3.5];
        assert!((mse(&a, &b).unwrap() - 0.25).abs() < DELTA);
    }

    #[test]
    fn test_mse_rejects_length_mismatch() {
        let err = mse(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err.code(), "SHAPE_MISMATCH");
    }

    #[test]
    fn test_mse_rejects_empty() {
        assert!(matches!(
            mse(&[], &[]),
            Err(MetricError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_nrmse_zero_range_floor() {
        let flat = [4.0, 4.0, 4.0];
        let other = [1.0, 2.0, 3.0];
        assert_eq!(nrmse(&flat, &other).unwrap(), 0.0);
    }

    #[test]
    fn test_nrmse_scales_by_range() {
        let a = [0.0, 10.0];
        let b = [1.0, 11.0];
        assert!((nrmse(&a, &b).unwrap() - 0.1).abs() < DELTA);
    }

    #[test]
    fn test_psnr_identical_is_infinite() {
        let a = [10.0, 20.0];
        assert_eq!(psnr(&a, &a, PeakSignal::EightBit).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_psnr_peaks() {
        let a = [0.0, 100.0];
        let b = [1.0, 101.0];
        let eight_bit = psnr(&a, &b, PeakSignal::EightBit).unwrap();
        assert!((eight_bit - 10.0 * (255.0f64 * 255.0).log10()).abs() < 1e-9);
        let ref_max = psnr(&a, &b, PeakSignal::ReferenceMax).unwrap();
        assert!((ref_max - 40.0).abs() < 1e-9);
    }
}
