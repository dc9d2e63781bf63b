//! Error types for tabular reconstruction.

use thiserror::Error;

/// Errors that can occur while reading per-execution records and rebuilding
/// vectors or matrices from them. Any of these is fatal to the file being read.
#[derive(Error, Debug)]
pub enum ReconstructionError {
    #[error("Failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{column}' is missing from the header")]
    MissingColumn { column: String },

    #[error("Line {line}: field '{field}' has invalid value '{value}'")]
    InvalidField {
        line: u64,
        field: String,
        value: String,
    },

    #[error("Line {line}: field '{field}' must be a 1-based index, got 0")]
    ZeroIndex { line: u64, field: String },

    #[error("Line {line}: field '{field}' value {value} exceeds the limit of {limit}")]
    IndexOutOfRange {
        line: u64,
        field: String,
        value: usize,
        limit: usize,
    },

    #[error("Reconstructed data would exceed {limit} values")]
    TooLarge { limit: usize },

    #[error("Execution indices are not contiguous: execution {missing} has no records")]
    NonContiguousExecutions { missing: usize },
}

impl ReconstructionError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ReconstructionError::Io { .. } => "INPUT_UNREADABLE",
            ReconstructionError::Csv(_) => "PARSE_CSV",
            ReconstructionError::MissingColumn { .. } => "PARSE_MISSING_COLUMN",
            ReconstructionError::InvalidField { .. } => "PARSE_INVALID_FIELD",
            ReconstructionError::ZeroIndex { .. } => "PARSE_ZERO_INDEX",
            ReconstructionError::IndexOutOfRange { .. } => "PARSE_INDEX_OUT_OF_RANGE",
            ReconstructionError::TooLarge { .. } => "PARSE_TOO_LARGE",
            ReconstructionError::NonContiguousExecutions { .. } => "PARSE_EXECUTION_GAP",
        }
    }
}
