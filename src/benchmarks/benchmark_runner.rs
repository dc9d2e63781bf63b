//! Core benchmark execution logic.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{HarnessConfig, ScalingReport};
use super::cache_topology::CacheProfile;
use super::calibration::{Kernel, Precision, tier_thresholds};
use super::timing_harness::{BenchmarkProgram, TimingHarness};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T: serde::de::DeserializeOwned + Default>(
        path: &str,
        config_name: &str,
    ) -> BenchmarkResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| BenchmarkError::ConfigParseError {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
        }
    }

    /// Load and validate the harness configuration
    pub fn load_harness_config(path: Option<&Path>) -> BenchmarkResult<HarnessConfig> {
        let config: HarnessConfig = match path {
            Some(path) => Self::load_config(&path.to_string_lossy(), "harness")?,
            None => HarnessConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// A scaling benchmark of one program
pub struct BenchmarkRunner<P: BenchmarkProgram> {
    harness: TimingHarness<P>,
    kernel: Kernel,
    precision: Precision,
    profile: CacheProfile,
}

impl<P: BenchmarkProgram> BenchmarkRunner<P> {
    pub fn new(
        program: P,
        config: &HarnessConfig,
        kernel: Kernel,
        precision: Precision,
        profile: CacheProfile,
    ) -> Self {
        Self {
            harness: TimingHarness::new(program, config),
            kernel,
            precision,
            profile,
        }
    }

    /// Times every size and places the cache tiers on the same axis
    pub fn run(&self, sizes: &[usize]) -> BenchmarkResult<ScalingReport> {
        let program = self.harness.program().name().to_string();

        info!("{}", "=".repeat(80));
        info!(
            "Scaling benchmark: {} ({}, {:?}, {} memory model)",
            program,
            self.kernel,
            self.precision,
            self.kernel.memory_model()
        );
        info!("Problem sizes: {:?}", sizes);
        info!("{}", "=".repeat(80));

        let thresholds = tier_thresholds(&self.profile, self.precision, self.kernel.memory_model());
        let timings = self.harness.run(sizes)?;

        let report = ScalingReport {
            program,
            kernel: self.kernel,
            precision: self.precision,
            profile: self.profile,
            thresholds,
            timings,
        };

        let max_n = report.max_problem_size();
        for threshold in &report.thresholds {
            if !threshold.is_reachable(max_n) {
                warn!(
                    "Tier not reachable: {} (n={})",
                    threshold.name,
                    threshold
                        .problem_size
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }

        let empty_slots = report
            .timings
            .samples
            .iter()
            .filter(|sample| sample.medians.iter().any(Option::is_none))
            .count();
        if empty_slots > 0 {
            warn!("{} size(s) have slots with no successful trial", empty_slots);
        }

        Ok(report)
    }
}
