//! Benchmark type definitions and configuration structures.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::cache_topology::CacheProfile;
use super::calibration::{Kernel, Precision, TierThreshold};
use super::timing_harness::TimingReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the timing harness and result capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Invocations per problem size
    pub trials: u32,
    pub seed: u64,
    /// Literal preceding each reported duration
    pub marker: String,
    /// Literal preceding each line of per-element results
    pub result_marker: String,
    /// Flag asking the program to print per-element results
    pub verbosity_flag: String,
    /// Timeout of the single run that counts timing slots
    pub calibration_timeout_secs: u64,
    /// Optional launcher, e.g. an emulator such as `qemu-aarch64`
    pub wrapper: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            trials: 11,
            seed: 1234,
            marker: "Tiempo de ejecucion".to_string(),
            result_marker: "Resultados ejecucion".to_string(),
            verbosity_flag: "-v".to_string(),
            calibration_timeout_secs: 10,
            wrapper: None,
        }
    }
}

impl HarnessConfig {
    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.trials == 0 {
            return Err(BenchmarkError::InvalidTrialCount { value: self.trials });
        }

        if self.marker.trim().is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: "marker".to_string(),
                message: "Timing marker must not be empty".to_string(),
            });
        }

        if self.result_marker.trim().is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: "result_marker".to_string(),
                message: "Result marker must not be empty".to_string(),
            });
        }

        if self.calibration_timeout_secs == 0 {
            return Err(BenchmarkError::ConfigValidationError {
                field: "calibration_timeout_secs".to_string(),
                message: "Calibration timeout must be greater than 0".to_string(),
            });
        }

        if let Some(wrapper) = &self.wrapper {
            if wrapper.trim().is_empty() {
                return Err(BenchmarkError::ConfigValidationError {
                    field: "wrapper".to_string(),
                    message: "Wrapper must not be empty when set".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn calibration_timeout(&self) -> Duration {
        Duration::from_secs(self.calibration_timeout_secs)
    }
}

/// Everything a scaling run produces, ready for plotting
#[derive(Debug, Clone, Serialize)]
pub struct ScalingReport {
    pub program: String,
    pub kernel: Kernel,
    pub precision: Precision,
    pub profile: CacheProfile,
    pub thresholds: Vec<TierThreshold>,
    pub timings: TimingReport,
}

impl ScalingReport {
    /// Largest requested problem size, 0 for an empty run
    pub fn max_problem_size(&self) -> usize {
        self.timings
            .samples
            .iter()
            .map(|sample| sample.n)
            .max()
            .unwrap_or(0)
    }

    /// Tiers the run actually crosses
    pub fn reachable_thresholds(&self) -> Vec<&TierThreshold> {
        let max_n = self.max_problem_size();
        self.thresholds
            .iter()
            .filter(|threshold| threshold.is_reachable(max_n))
            .collect()
    }
}
