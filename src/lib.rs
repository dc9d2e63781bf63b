//! Numeric fidelity comparison and cache-aware timing for signal-processing kernels.
//!
//! This library ingests the outputs of several independent implementations of the
//! same kernel (AXPY, DCT, 1-D DWT, PCA), compares them against a reference with a
//! battery of fidelity metrics, and measures how execution time scales with problem
//! size across the cache hierarchy of the host.

pub mod benchmarks;
pub mod comparison;
pub mod errors;
pub mod metrics;
pub mod reconstruction;
pub mod series;

pub use comparison::{Candidate, Comparator, ComparisonReport, ComparisonResult};
pub use metrics::{Metric, MetricValue, PeakSignal};
pub use series::{DataKind, Execution, ExecutionSeries, Matrix, Shape};
