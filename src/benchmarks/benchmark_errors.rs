//! Error types for benchmark operations.

use crate::errors::{MetricError, ReconstructionError};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BenchmarkError {
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },
    ConfigValidationError {
        field: String,
        message: String,
    },
    IoError {
        source: std::io::Error,
    },
    InvalidTrialCount {
        value: u32,
    },
    EmptySizeList,
    ProcessFailed {
        program: String,
        message: String,
    },
    Timeout {
        program: String,
        seconds: f64,
    },
    InsufficientMemory {
        budget_bytes: f64,
        model: String,
    },
    MalformedTiming {
        line: String,
    },
    MalformedTable {
        path: String,
        message: String,
    },
    MalformedResult {
        line: String,
    },
    ResultCountMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },
    NoResults {
        program: String,
    },
    TableMismatch {
        message: String,
    },
    CsvError {
        source: csv::Error,
    },
    MetricError {
        source: MetricError,
    },
    ReconstructionError {
        source: ReconstructionError,
    },
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::ConfigParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration file '{}': {}",
                    path, source
                )
            }
            BenchmarkError::ConfigValidationError { field, message } => {
                write!(
                    f,
                    "Configuration validation error for field '{}': {}",
                    field, message
                )
            }
            BenchmarkError::IoError { source } => {
                write!(f, "IO error: {}", source)
            }
            BenchmarkError::InvalidTrialCount { value } => {
                write!(
                    f,
                    "Invalid number of trials: {}. Must be greater than 0",
                    value
                )
            }
            BenchmarkError::EmptySizeList => {
                write!(f, "At least one problem size is required")
            }
            BenchmarkError::ProcessFailed { program, message } => {
                write!(f, "Program '{}' failed: {}", program, message)
            }
            BenchmarkError::Timeout { program, seconds } => {
                write!(
                    f,
                    "Program '{}' did not finish within {:.1} s",
                    program, seconds
                )
            }
            BenchmarkError::InsufficientMemory {
                budget_bytes,
                model,
            } => {
                write!(
                    f,
                    "A budget of {} bytes admits no positive problem size for the {} memory model",
                    budget_bytes, model
                )
            }
            BenchmarkError::MalformedTiming { line } => {
                write!(f, "Malformed timing line: '{}'", line)
            }
            BenchmarkError::MalformedTable { path, message } => {
                write!(f, "Malformed timing table '{}': {}", path, message)
            }
            BenchmarkError::MalformedResult { line } => {
                write!(f, "Malformed result line: '{}'", line)
            }
            BenchmarkError::ResultCountMismatch {
                line,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Result line {} has {} values, expected {}",
                    line, actual, expected
                )
            }
            BenchmarkError::NoResults { program } => {
                write!(f, "Program '{}' reported no result lines", program)
            }
            BenchmarkError::TableMismatch { message } => {
                write!(f, "Timing tables are not comparable: {}", message)
            }
            BenchmarkError::CsvError { source } => {
                write!(f, "CSV error: {}", source)
            }
            BenchmarkError::MetricError { source } => {
                write!(f, "Metric error: {}", source)
            }
            BenchmarkError::ReconstructionError { source } => {
                write!(f, "{}", source)
            }
        }
    }
}

impl BenchmarkError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BenchmarkError::ConfigParseError { .. } => "CONFIG_PARSE",
            BenchmarkError::ConfigValidationError { .. } => "CONFIG_VALIDATION",
            BenchmarkError::IoError { .. } => "IO",
            BenchmarkError::InvalidTrialCount { .. } => "CONFIG_VALIDATION",
            BenchmarkError::EmptySizeList => "CONFIG_VALIDATION",
            BenchmarkError::ProcessFailed { .. } => "PROCESS_FAILED",
            BenchmarkError::Timeout { .. } => "PROCESS_TIMEOUT",
            BenchmarkError::InsufficientMemory { .. } => "DOMAIN_INSUFFICIENT_MEMORY",
            BenchmarkError::MalformedTiming { .. } => "PARSE_TIMING",
            BenchmarkError::MalformedTable { .. } => "PARSE_TABLE",
            BenchmarkError::MalformedResult { .. } => "PARSE_RESULT",
            BenchmarkError::ResultCountMismatch { .. } => "RESULT_COUNT_MISMATCH",
            BenchmarkError::NoResults { .. } => "RESULT_EMPTY",
            BenchmarkError::TableMismatch { .. } => "TABLE_MISMATCH",
            BenchmarkError::CsvError { .. } => "PARSE_CSV",
            BenchmarkError::MetricError { source } => source.code(),
            BenchmarkError::ReconstructionError { source } => source.code(),
        }
    }
}

impl Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchmarkError::ConfigParseError { source, .. } => Some(source),
            BenchmarkError::IoError { source } => Some(source),
            BenchmarkError::CsvError { source } => Some(source),
            BenchmarkError::MetricError { source } => Some(source),
            BenchmarkError::ReconstructionError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BenchmarkError {
    fn from(error: std::io::Error) -> Self {
        BenchmarkError::IoError { source: error }
    }
}

impl From<csv::Error> for BenchmarkError {
    fn from(error: csv::Error) -> Self {
        BenchmarkError::CsvError { source: error }
    }
}

impl From<MetricError> for BenchmarkError {
    fn from(error: MetricError) -> Self {
        BenchmarkError::MetricError { source: error }
    }
}

impl From<ReconstructionError> for BenchmarkError {
    fn from(error: ReconstructionError) -> Self {
        BenchmarkError::ReconstructionError { source: error }
    }
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
