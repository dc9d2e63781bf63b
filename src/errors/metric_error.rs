//! Error types for metric computations.

use crate::series::Shape;
use thiserror::Error;

/// Errors that can occur while computing a fidelity metric.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Shape mismatch: reference {reference} vs candidate {candidate}")]
    ShapeMismatch { reference: Shape, candidate: Shape },

    #[error("Dual-band data must have an even length, got {len}")]
    OddLength { len: usize },

    #[error("Metric '{metric}' requires at least one element")]
    EmptyInput { metric: &'static str },

    #[error("Division by zero while computing {metric}")]
    DivisionByZero { metric: &'static str },
}

impl MetricError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            MetricError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            MetricError::OddLength { .. } => "VALIDATION_ODD_LENGTH",
            MetricError::EmptyInput { .. } => "VALIDATION_EMPTY",
            MetricError::DivisionByZero { .. } => "DIVISION_BY_ZERO",
        }
    }
}
