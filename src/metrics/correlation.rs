//! Pearson product-moment correlation and its dual-band form.

use super::error::check_lengths;
use crate::errors::{MetricError, MetricResult};

/// Pearson correlation coefficient.
///
/// Returns `0.0` when either input has zero variance instead of NaN.
pub fn pearson(reference: &[f64], candidate: &[f64]) -> MetricResult<f64> {
    check_lengths(reference, candidate)?;
    if reference.is_empty() {
        return Err(MetricError::EmptyInput { metric: "Pearson" });
    }

    let n = reference.len() as f64;
    let mean_ref = reference.iter().sum::<f64>() / n;
    let mean_cand = candidate.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_ref = 0.0;
    let mut var_cand = 0.0;
    for (r, c) in reference.iter().zip(candidate.iter()) {
        let dr = r - mean_ref;
        let dc = c - mean_cand;
        covariance += dr * dc;
        var_ref += dr * dr;
        var_cand += dc * dc;
    }

    if var_ref == 0.0 || var_cand == 0.0 {
        return Ok(0.0);
    }

    let r = covariance / (var_ref.sqrt() * var_cand.sqrt());
    Ok(r.clamp(-1.0, 1.0))
}

/// Correlates the approximation (first half) and detail (second half) bands
/// of a concatenated two-band decomposition independently.
///
/// Returns `(approximation, detail)`. Fails with `OddLength` when the inputs
/// cannot be split evenly.
pub fn dual_band_pearson(reference: &[f64], candidate: &[f64]) -> MetricResult<(f64, f64)> {
    check_lengths(reference, candidate)?;
    if reference.len() % 2 != 0 {
        return Err(MetricError::OddLength {
            len: reference.len(),
        });
    }

    let half = reference.len() / 2;
    let (ref_approx, ref_detail) = reference.split_at(half);
    let (cand_approx, cand_detail) = candidate.split_at(half);
    Ok((
        pearson(ref_approx, cand_approx)?,
        pearson(ref_detail, cand_detail)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f64 = 1e-12;

    #[test]
    fn test_self_correlation_is_one() {
        let a = [1.0, 3.0, -2.0, 7.5];
        assert!((pearson(&a, &a).unwrap() - 1.0).abs() < DELTA);
    }

    #[test]
    fn test_anti_correlation() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        assert!((pearson(&a, &b).unwrap() + 1.0).abs() < DELTA);
    }

    #[test]
    fn test_zero_variance_is_zero_not_nan() {
        let flat = [2.0, 2.0, 2.0];
        let varied = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&flat, &varied).unwrap(), 0.0);
        assert_eq!(pearson(&varied, &flat).unwrap(), 0.0);
    }

    #[test]
    fn test_dual_band_splits_at_midpoint() {
        // Approximation band matches, detail band is reversed.
        let reference = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
        let candidate = [2.0, 4.0, 6.0, 3.0, 2.0, 1.0];
        let (approx, detail) = dual_band_pearson(&reference, &candidate).unwrap();
        assert!((approx - 1.0).abs() < DELTA);
        assert!((detail + 1.0).abs() < DELTA);
    }

    #[test]
    fn test_dual_band_rejects_odd_length() {
        let a = [1.0, 2.0, 3.0];
        assert_eq!(
            dual_band_pearson(&a, &a).unwrap_err(),
            MetricError::OddLength { len: 3 }
        );
    }
}
