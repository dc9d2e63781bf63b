//! Error types for reference/candidate comparisons.

use super::{MetricError, ReconstructionError};
use crate::series::{DataKind, Shape};
use thiserror::Error;

/// Errors raised while comparing candidates against a reference.
///
/// `EmptyReference`, `NonUniformReference` and reference-side `Reconstruction`
/// failures abort a run. Everything else is scoped to a single candidate.
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Reference '{reference}' contains no executions")]
    EmptyReference { reference: String },

    #[error(
        "Reference '{reference}' execution {execution} has shape {actual}, expected {expected}"
    )]
    NonUniformReference {
        reference: String,
        execution: usize,
        expected: Shape,
        actual: Shape,
    },

    #[error("Data kind mismatch: expected {expected} data, got {actual}")]
    KindMismatch { expected: DataKind, actual: DataKind },

    #[error("Different number of executions ({expected} vs {actual})")]
    ExecutionCountMismatch { expected: usize, actual: usize },

    #[error("Execution {execution}: {source}")]
    Metric {
        execution: usize,
        #[source]
        source: MetricError,
    },

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    #[error("Failed to write report: {0}")]
    Report(#[from] csv::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ComparisonError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ComparisonError::EmptyReference { .. } => "REFERENCE_EMPTY",
            ComparisonError::NonUniformReference { .. } => "REFERENCE_NON_UNIFORM",
            ComparisonError::KindMismatch { .. } => "KIND_MISMATCH",
            ComparisonError::ExecutionCountMismatch { .. } => "EXECUTION_COUNT_MISMATCH",
            ComparisonError::Metric { source, .. } => source.code(),
            ComparisonError::Reconstruction(source) => source.code(),
            ComparisonError::Report(_) => "REPORT_WRITE",
            ComparisonError::Serialization(_) => "REPORT_SERIALIZE",
        }
    }
}
