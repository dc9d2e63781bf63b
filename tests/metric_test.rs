//! Property-style checks of the fidelity metrics through the public API.

use kernel_fidelity::metrics::{
    compression_ratio, dual_band_pearson, mse, nrmse, pearson, psnr, speedup,
    stream_compression_ratio, structural_similarity,
};
use kernel_fidelity::{Execution, Matrix, Metric, MetricValue, PeakSignal};

const DELTA: f64 = 1e-9;

fn signal(len: usize) -> Vec<f64> {
    (0..len).map(|i| ((i * 37) % 11) as f64 * 0.5 - 2.0).collect()
}

#[cfg(test)]
mod metric_tests {
    use super::*;

    #[test]
    fn test_identity_values() {
        let a = signal(32);
        assert_eq!(mse(&a, &a).unwrap(), 0.0);
        assert_eq!(nrmse(&a, &a).unwrap(), 0.0);
        assert!((pearson(&a, &a).unwrap() - 1.0).abs() < DELTA);
        assert_eq!(psnr(&a, &a, PeakSignal::ReferenceMax).unwrap(), f64::INFINITY);
        assert!((compression_ratio(&a, &a).unwrap() - 1.0).abs() < DELTA);
    }

    #[test]
    fn test_degenerate_inputs_give_zero() {
        let constant = vec![3.0; 8];
        let other = signal(8);
        assert_eq!(nrmse(&constant, &other).unwrap(), 0.0);
        assert_eq!(pearson(&constant, &other).unwrap(), 0.0);
        assert_eq!(pearson(&other, &constant).unwrap(), 0.0);
    }

    #[test]
    fn test_pearson_is_bounded_and_sign_aware() {
        let a = signal(64);
        let negated: Vec<f64> = a.iter().map(|v| -3.0 * v + 1.0).collect();
        let r = pearson(&a, &negated).unwrap();
        assert!((r + 1.0).abs() < DELTA);
        assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn test_dual_band_halves_are_independent() {
        // Approximation band identical, detail band reversed.
        let reference = vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0];
        let candidate = vec![1.0, 2.0, 3.0, 4.0, 4.0, 3.0, 2.0, 1.0];
        let (approximation, detail) = dual_band_pearson(&reference, &candidate).unwrap();
        assert!((approximation - 1.0).abs() < DELTA);
        assert!((detail + 1.0).abs() < DELTA);
    }

    #[test]
    fn test_eight_bit_psnr() {
        let reference = vec![0.0, 0.0, 0.0, 0.0];
        let candidate = vec![1.0, 1.0, 1.0, 1.0];
        let expected = 20.0 * 255.0_f64.log10();
        assert!((psnr(&reference, &candidate, PeakSignal::EightBit).unwrap() - expected).abs() < DELTA);
    }

    #[test]
    fn test_ssim_of_identical_matrices_is_one() {
        let data: Vec<f64> = (0..100).map(|i| (i % 13) as f64).collect();
        let m = Execution::Matrix(Matrix::from_row_major(10, 10, data).unwrap());
        assert!((structural_similarity(&m, &m).unwrap() - 1.0).abs() < DELTA);
    }

    #[test]
    fn test_ssim_drops_for_noisy_candidate() {
        let data: Vec<f64> = (0..100).map(|i| (i % 13) as f64).collect();
        let noisy: Vec<f64> = data
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v + 3.0 } else { v - 3.0 })
            .collect();
        let reference = Execution::Matrix(Matrix::from_row_major(10, 10, data).unwrap());
        let candidate = Execution::Matrix(Matrix::from_row_major(10, 10, noisy).unwrap());
        assert!(structural_similarity(&reference, &candidate).unwrap() < 1.0);
    }

    #[test]
    fn test_ratios() {
        assert!((stream_compression_ratio(&[0u8; 100], &[0u8; 25]).unwrap() - 4.0).abs() < DELTA);
        assert!((speedup(2.0, 0.5).unwrap() - 4.0).abs() < DELTA);
    }

    #[test]
    fn test_metric_dispatch_by_name() {
        let reference = Execution::Vector(vec![1.0, 2.0, 3.0]);
        let candidate = Execution::Vector(vec![1.5, 2.5, 3.5]);
        let metric: Metric = "mse".parse().unwrap();
        match metric.evaluate(&reference, &candidate).unwrap() {
            MetricValue::Scalar(value) => assert!((value - 0.25).abs() < DELTA),
            other => panic!("unexpected value: {:?}", other),
        }
        assert!("rmse".parse::<Metric>().is_err());
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }
}
