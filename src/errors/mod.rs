//! Error types for the fidelity library.
//!
//! This module contains specific error types used throughout the library,
//! avoiding generic error wrappers like `anyhow` or `Box<dyn Error>` for better
//! error handling and debugging.

mod comparison_error;
mod metric_error;
mod reconstruction_error;

pub use comparison_error::ComparisonError;
pub use metric_error::MetricError;
pub use reconstruction_error::ReconstructionError;

/// Result type alias for reading and rebuilding tabular execution data.
pub type ReconstructionResult<T> = std::result::Result<T, ReconstructionError>;

/// Result type alias for metric computations.
pub type MetricResult<T> = std::result::Result<T, MetricError>;
