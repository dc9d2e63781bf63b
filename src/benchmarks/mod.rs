//! Cache-aware timing harness for external kernel executables.
//!
//! Sizes are derived from the host cache hierarchy, each size is timed over
//! repeated trials of the external program, and trials are reduced to per-slot
//! medians.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod cache_topology;
pub mod calibration;
pub mod performance_metrics;
pub mod result_capture;
pub mod timing_harness;
pub mod timing_table;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{BenchmarkRunner, ConfigLoader};
pub use benchmark_types::{HarnessConfig, ScalingReport};
pub use cache_topology::{CacheProfile, CacheTier};
pub use calibration::{Kernel, MemoryModel, Precision, TierThreshold, problem_size_for_budget};
pub use timing_harness::{
    BenchmarkProgram, ExternalProgram, Invocation, TimingHarness, TimingReport, TimingSample,
};
pub use timing_table::TimingTable;
