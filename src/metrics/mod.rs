//! Fidelity metrics.
//!
//! Each metric is a pure function over two equal-shape containers. Matrices are
//! flattened row-major for the flat metrics; SSIM keeps the 2-D layout.
//!
//! # Metrics
//!
//! - **MSE**: mean squared error
//! - **NRMSE**: RMSE divided by the reference range, `0.0` for a constant reference
//! - **Pearson**: correlation, `0.0` when either side has zero variance
//! - **Dual-band Pearson**: Pearson on each half of a concatenated two-band signal
//! - **PSNR**: peak signal-to-noise ratio, `+inf` for identical inputs
//! - **SSIM**: windowed structural similarity
//!
//! Compression ratio and speedup are plain size/time ratios and are not
//! selectable through [`Metric`].

mod correlation;
mod error;
mod ratio;
mod ssim;

pub use correlation::{dual_band_pearson, pearson};
pub use error::{PeakSignal, mse, nrmse, psnr};
pub use ratio::{compression_ratio, speedup, stream_compression_ratio};
pub use ssim::structural_similarity;

use crate::errors::{MetricError, MetricResult};
use crate::series::Execution;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The value a metric produces for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    /// `(approximation, detail)` for dual-band metrics.
    Pair(f64, f64),
}

impl MetricValue {
    /// Renders the value as report cells with a fixed number of decimals.
    pub fn cells(&self, decimals: usize) -> Vec<String> {
        match self {
            MetricValue::Scalar(v) => vec![format_float(*v, decimals)],
            MetricValue::Pair(a, b) => vec![format_float(*a, decimals), format_float(*b, decimals)],
        }
    }
}

/// Fixed-point formatting that spells out non-finite values.
pub fn format_float(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

/// A comparison metric selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Mse,
    Nrmse,
    Pearson,
    DualBandPearson,
    Psnr(PeakSignal),
    Ssim,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Mse,
        Metric::Nrmse,
        Metric::Pearson,
        Metric::DualBandPearson,
        Metric::Psnr(PeakSignal::ReferenceMax),
        Metric::Psnr(PeakSignal::EightBit),
        Metric::Ssim,
    ];

    /// Command-line name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Nrmse => "nrmse",
            Metric::Pearson => "pearson",
            Metric::DualBandPearson => "pearson-dual",
            Metric::Psnr(PeakSignal::ReferenceMax) => "psnr",
            Metric::Psnr(PeakSignal::EightBit) => "psnr-8bit",
            Metric::Ssim => "ssim",
        }
    }

    /// Get a metric by its command-line name.
    pub fn get_by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.name() == name)
    }

    /// Short label used in report comment lines.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Mse => "MSE",
            Metric::Nrmse => "NRMSE",
            Metric::Pearson | Metric::DualBandPearson => "Pearson",
            Metric::Psnr(_) => "PSNR",
            Metric::Ssim => "SSIM",
        }
    }

    /// Value columns of a tabular report.
    pub fn column_headers(&self) -> Vec<&'static str> {
        match self {
            Metric::DualBandPearson => vec!["Pearson_Aproximacion", "Pearson_Detalle"],
            other => vec![other.label()],
        }
    }

    /// Decimal places used when serialising values.
    pub fn decimals(&self) -> usize {
        match self {
            Metric::Psnr(_) => 5,
            Metric::Ssim => 6,
            _ => 8,
        }
    }

    /// Evaluates the metric on one reference/candidate execution pair.
    ///
    /// The full shapes must match; two matrices with the same element count
    /// but different dimensions are rejected.
    pub fn evaluate(&self, reference: &Execution, candidate: &Execution) -> MetricResult<MetricValue> {
        if reference.shape() != candidate.shape() {
            return Err(MetricError::ShapeMismatch {
                reference: reference.shape(),
                candidate: candidate.shape(),
            });
        }
        let (r, c) = (reference.values(), candidate.values());
        let value = match self {
            Metric::Mse => MetricValue::Scalar(mse(r, c)?),
            Metric::Nrmse => MetricValue::Scalar(nrmse(r, c)?),
            Metric::Pearson => MetricValue::Scalar(pearson(r, c)?),
            Metric::DualBandPearson => {
                let (approx, detail) = dual_band_pearson(r, c)?;
                MetricValue::Pair(approx, detail)
            }
            Metric::Psnr(peak) => MetricValue::Scalar(psnr(r, c, *peak)?),
            Metric::Ssim => MetricValue::Scalar(structural_similarity(reference, candidate)?),
        };
        Ok(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::get_by_name(&s.to_ascii_lowercase()).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
            format!("unknown metric '{s}' (expected one of: {})", known.join(", "))
        })
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Matrix;

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
        assert!("bogus".parse::<Metric>().is_err());
    }

    #[test]
    fn test_evaluate_checks_full_shape() {
        let a = Execution::Matrix(Matrix::zeros(2, 3));
        let b = Execution::Matrix(Matrix::zeros(3, 2));
        assert!(matches!(
            Metric::Mse.evaluate(&a, &b),
            Err(MetricError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_dual_band_yields_pair() {
        let a = Execution::Vector(vec![1.0, 2.0, 3.0, 4.0]);
        let value = Metric::DualBandPearson.evaluate(&a, &a).unwrap();
        assert!(matches!(value, MetricValue::Pair(_, _)));
        assert_eq!(value.cells(2).len(), 2);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.123456789, 8), "0.12345679");
        assert_eq!(format_float(f64::INFINITY, 5), "inf");
        assert_eq!(format_float(1.5, 5), "1.50000");
    }
}
