//! Problem-size calibration from a memory budget.
//!
//! Each kernel family has a memory model relating problem size `n` to its
//! working set. Calibration inverts that model to find the largest `n` that fits a
//! byte budget, so benchmark sizes can be placed on either side of each cache
//! tier boundary.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::cache_topology::CacheProfile;
use crate::series::DataKind;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter coefficients held by the convolution kernels: 7 + 9 doubles.
pub const KERNEL_COEFFICIENT_BYTES: f64 = ((7 + 9) * 8) as f64;

/// Problem sizes for linear-family kernels.
pub const LINEAR_SIZES: [usize; 19] = [
    4096, 6144, 8192, 12288, 16384, 32768, 65536, 98304, 131072, 163840, 196608, 262144, 327680,
    524288, 786432, 917504, 1048576, 1310720, 1742848,
];

/// Extended problem sizes for linear-family kernels.
pub const LINEAR_SIZES_EXTENDED: [usize; 31] = [
    4096, 6144, 8192, 12288, 16384, 32768, 65536, 98304, 131072, 163840, 196608, 262144, 327680,
    524288, 786432, 917504, 1048576, 1310720, 1742848, 1802240, 1911728, 2097152, 3145728,
    4194304, 8388608, 12582912, 16777216, 20971520, 33554432, 67108864, 134217728,
];

/// Matrix side lengths for quadratic kernels.
pub const MATRIX_SIZES: [usize; 21] = [
    2, 10, 55, 100, 200, 291, 400, 500, 600, 700, 800, 900, 933, 1100, 1200, 1300, 1400, 1550,
    1700, 1850, 2000,
];

/// Extended matrix side lengths for quadratic kernels.
pub const MATRIX_SIZES_EXTENDED: [usize; 23] = [
    2, 10, 55, 100, 200, 291, 400, 500, 600, 700, 800, 900, 933, 1100, 1200, 1300, 1400, 1550,
    1700, 1850, 2000, 2100, 2200,
];

/// How a kernel's working set grows with `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryModel {
    /// Two arrays of `n` elements.
    Linear,
    /// Two arrays of `n` elements plus fixed filter coefficients.
    KernelAugmentedLinear,
    /// `4n² + n` elements: an `n x n` matrix and its auxiliaries plus an
    /// `n`-vector.
    Quadratic,
}

impl fmt::Display for MemoryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryModel::Linear => write!(f, "linear"),
            MemoryModel::KernelAugmentedLinear => write!(f, "kernel-augmented linear"),
            MemoryModel::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// Kernels under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Axpy,
    Dct,
    Dwt1d,
    Pca,
    PcaReimpl,
}

impl Kernel {
    pub const ALL: [Kernel; 5] = [
        Kernel::Axpy,
        Kernel::Dct,
        Kernel::Dwt1d,
        Kernel::Pca,
        Kernel::PcaReimpl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Axpy => "axpy",
            Kernel::Dct => "dct",
            Kernel::Dwt1d => "dwt_1d",
            Kernel::Pca => "pca",
            Kernel::PcaReimpl => "pca_reimpl",
        }
    }

    pub fn memory_model(&self) -> MemoryModel {
        match self {
            Kernel::Axpy | Kernel::Dct => MemoryModel::Linear,
            Kernel::Dwt1d => MemoryModel::KernelAugmentedLinear,
            Kernel::Pca | Kernel::PcaReimpl => MemoryModel::Quadratic,
        }
    }

    /// Shape of the per-element results the kernel prints.
    pub fn data_kind(&self) -> DataKind {
        match self.memory_model() {
            MemoryModel::Quadratic => DataKind::Matrix,
            _ => DataKind::Vector,
        }
    }

    /// Default benchmark sizes for this kernel's memory model.
    pub fn default_problem_sizes(&self, extended: bool) -> Vec<usize> {
        match (self.memory_model(), extended) {
            (MemoryModel::Quadratic, false) => MATRIX_SIZES.to_vec(),
            (MemoryModel::Quadratic, true) => MATRIX_SIZES_EXTENDED.to_vec(),
            (_, false) => LINEAR_SIZES.to_vec(),
            (_, true) => LINEAR_SIZES_EXTENDED.to_vec(),
        }
    }

    /// Guesses the kernel from an executable name such as `pca_reimpl_FP16`.
    pub fn from_program_name(program: &str) -> Option<Self> {
        let lowered = program.to_ascii_lowercase();
        // Longest names first so `pca_reimpl` is not taken for `pca`.
        [
            Kernel::PcaReimpl,
            Kernel::Dwt1d,
            Kernel::Axpy,
            Kernel::Pca,
            Kernel::Dct,
        ]
        .into_iter()
        .find(|kernel| lowered.contains(kernel.name()))
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kernel::ALL
            .into_iter()
            .find(|kernel| kernel.name() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown kernel '{s}'"))
    }
}

/// Numeric precision of the kernel's arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Half,
    Single,
}

impl Precision {
    /// Element width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Precision::Half => 2,
            Precision::Single => 4,
        }
    }

    /// `Half` for `_FP16`, `_FP16_ARM` and `_BF16` builds, otherwise `Single`.
    pub fn from_program_name(program: &str) -> Self {
        const HALF_SUFFIXES: [&str; 3] = ["_FP16", "_FP16_ARM", "_BF16"];
        if HALF_SUFFIXES.iter().any(|suffix| program.contains(suffix)) {
            Precision::Half
        } else {
            Precision::Single
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "half" | "fp16" | "bf16" => Ok(Precision::Half),
            "single" | "float" | "fp32" => Ok(Precision::Single),
            _ => Err(format!("unknown precision '{s}'")),
        }
    }
}

/// Largest `n` whose working set under `model` fits in `budget_bytes`.
pub fn problem_size_for_budget(
    budget_bytes: f64,
    precision: Precision,
    model: MemoryModel,
) -> BenchmarkResult<usize> {
    let insufficient = || BenchmarkError::InsufficientMemory {
        budget_bytes,
        model: model.to_string(),
    };
    if !budget_bytes.is_finite() || budget_bytes < 0.0 {
        return Err(insufficient());
    }
    let width = precision.width() as f64;

    let n = match model {
        MemoryModel::Quadratic => {
            // 4n² + n - total = 0
            let total = budget_bytes / width;
            let (a, b, c) = (4.0, 1.0, -total);
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return Err(insufficient());
            }
            (-b + discriminant.sqrt()) / (2.0 * a)
        }
        MemoryModel::KernelAugmentedLinear => {
            let available = budget_bytes - KERNEL_COEFFICIENT_BYTES;
            if available <= 0.0 {
                return Err(insufficient());
            }
            available / (2.0 * width)
        }
        MemoryModel::Linear => budget_bytes / (2.0 * width),
    };
    Ok(n.floor() as usize)
}

/// A cache tier expressed as a problem size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierThreshold {
    pub name: &'static str,
    pub bytes: f64,
    /// `None` when the tier is too small for any positive problem size.
    pub problem_size: Option<usize>,
}

impl TierThreshold {
    /// Whether a run whose largest size is `max_n` crosses this tier.
    pub fn is_reachable(&self, max_n: usize) -> bool {
        self.problem_size.is_some_and(|n| max_n >= n)
    }
}

/// Converts every cumulative tier of `profile` to a problem size.
pub fn tier_thresholds(
    profile: &CacheProfile,
    precision: Precision,
    model: MemoryModel,
) -> Vec<TierThreshold> {
    profile
        .tiers()
        .into_iter()
        .map(|tier| {
            let problem_size = match problem_size_for_budget(tier.bytes, precision, model) {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!("Tier {}: {}", tier.name, e);
                    None
                }
            };
            TierThreshold {
                name: tier.name,
                bytes: tier.bytes,
                problem_size,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_recovers_exact_root() {
        let n = 100.0;
        let bytes = 4.0 * (4.0 * n * n + n);
        assert_eq!(
            problem_size_for_budget(bytes, Precision::Single, MemoryModel::Quadratic).unwrap(),
            100
        );
    }

    #[test]
    fn test_linear_halves_by_width() {
        assert_eq!(
            problem_size_for_budget(4096.0, Precision::Single, MemoryModel::Linear).unwrap(),
            512
        );
        assert_eq!(
            problem_size_for_budget(4096.0, Precision::Half, MemoryModel::Linear).unwrap(),
            1024
        );
    }

    #[test]
    fn test_augmented_reserves_coefficients() {
        let n = problem_size_for_budget(
            1024.0 + KERNEL_COEFFICIENT_BYTES,
            Precision::Single,
            MemoryModel::KernelAugmentedLinear,
        )
        .unwrap();
        assert_eq!(n, 128);

        let err = problem_size_for_budget(100.0, Precision::Single, MemoryModel::KernelAugmentedLinear)
            .unwrap_err();
        assert_eq!(err.code(), "DOMAIN_INSUFFICIENT_MEMORY");
    }

    #[test]
    fn test_negative_budget_is_rejected() {
        assert!(problem_size_for_budget(-1.0, Precision::Single, MemoryModel::Quadratic).is_err());
    }

    #[test]
    fn test_kernel_from_program_name() {
        assert_eq!(Kernel::from_program_name("pca_reimpl_FP16"), Some(Kernel::PcaReimpl));
        assert_eq!(Kernel::from_program_name("PCA_FP32"), Some(Kernel::Pca));
        assert_eq!(Kernel::from_program_name("dwt_1d_BF16"), Some(Kernel::Dwt1d));
        assert_eq!(Kernel::from_program_name("fft"), None);
        assert_eq!(Kernel::Pca.data_kind(), DataKind::Matrix);
    }

    #[test]
    fn test_precision_from_program_name() {
        assert_eq!(Precision::from_program_name("axpy_FP16_ARM"), Precision::Half);
        assert_eq!(Precision::from_program_name("axpy_BF16"), Precision::Half);
        assert_eq!(Precision::from_program_name("axpy_FP32"), Precision::Single);
    }

    #[test]
    fn test_tier_reachability() {
        let thresholds = tier_thresholds(
            &CacheProfile::FALLBACK,
            Precision::Single,
            MemoryModel::Linear,
        );
        assert_eq!(thresholds.len(), 5);
        // 48 KiB / 8 bytes per element pair.
        assert_eq!(thresholds[0].problem_size, Some(6144));
        assert!(thresholds[0].is_reachable(6144));
        assert!(!thresholds[4].is_reachable(6144));
    }
}
