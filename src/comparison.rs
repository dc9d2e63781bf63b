//! Reference/candidate comparison.
//!
//! A [`Comparator`] owns a validated reference series and a metric. Candidates are
//! processed one at a time in input order. A candidate whose execution count or
//! execution shapes disagree with the reference is skipped and recorded in the
//! report; it never aborts its siblings.

use crate::errors::ComparisonError;
use crate::metrics::{Metric, MetricValue};
use crate::reconstruction::load_series;
use crate::series::{DataKind, ExecutionSeries};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Kernel prefixes recognised in reference file names.
pub const KNOWN_OPERATIONS: [&str; 5] = ["axpy", "dct", "dwt_1d", "pca", "pca_reimpl"];

/// Label used when a reference name matches no known operation.
pub const UNKNOWN_OPERATION: &str = "OPERACION";

/// Report header of the candidate column.
pub const CONFIGURATION_HEADER: &str = "Configuración";
/// Report header of the execution-number column.
pub const EXECUTION_HEADER: &str = "Ejecución";

/// A named candidate dataset.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub series: ExecutionSeries,
}

impl Candidate {
    pub fn new(name: impl Into<String>, series: ExecutionSeries) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }
}

/// Per-execution metric values for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub candidate: String,
    pub reference: String,
    pub values: Vec<MetricValue>,
}

/// A candidate left out of the report.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCandidate {
    pub candidate: String,
    pub code: &'static str,
    pub reason: String,
}

/// Outcome of comparing every candidate against one reference.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub reference: String,
    pub metric: Metric,
    pub results: Vec<ComparisonResult>,
    pub skipped: Vec<SkippedCandidate>,
}

impl ComparisonReport {
    fn new(reference: &str, metric: Metric) -> Self {
        Self {
            reference: reference.to_string(),
            metric,
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, candidate: &str, error: &ComparisonError) {
        warn!("Skipping candidate '{}': {}", candidate, error);
        self.skipped.push(SkippedCandidate {
            candidate: candidate.to_string(),
            code: error.code(),
            reason: error.to_string(),
        });
    }

    /// True when every result holds exactly one execution. Decided over the
    /// whole result set, so one multi-execution candidate switches every row
    /// to numbered output.
    pub fn single_execution(&self) -> bool {
        self.results.iter().all(|result| result.values.len() == 1)
    }

    /// Writes the tabular report: two comment lines, a header, then one row per
    /// candidate execution.
    pub fn write_csv<W: Write>(&self, mut writer: W, operation: &str) -> Result<(), ComparisonError> {
        writeln!(writer, "# Resultados {}", operation).map_err(csv::Error::from)?;
        writeln!(writer, "# Referencia: {}", self.reference).map_err(csv::Error::from)?;

        let single = self.single_execution();
        let decimals = self.metric.decimals();
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![CONFIGURATION_HEADER];
        if !single {
            header.push(EXECUTION_HEADER);
        }
        header.extend(self.metric.column_headers());
        csv_writer.write_record(&header)?;

        for result in &self.results {
            for (execution, value) in result.values.iter().enumerate() {
                let mut row = vec![result.candidate.clone()];
                if !single {
                    row.push((execution + 1).to_string());
                }
                row.extend(value.cells(decimals));
                csv_writer.write_record(&row)?;
            }
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ComparisonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Upper-case operation label for a reference name, matched by prefix.
pub fn operation_label(reference_name: &str) -> String {
    KNOWN_OPERATIONS
        .iter()
        .filter(|prefix| reference_name.starts_with(*prefix))
        .max_by_key(|prefix| prefix.len())
        .map(|prefix| prefix.to_uppercase())
        .unwrap_or_else(|| UNKNOWN_OPERATION.to_string())
}

/// Compares candidates against a fixed reference with one metric.
#[derive(Debug)]
pub struct Comparator {
    reference_name: String,
    reference: ExecutionSeries,
    metric: Metric,
}

impl Comparator {
    /// Fails when the reference has no executions or its executions do not
    /// share one shape.
    pub fn new(
        reference_name: impl Into<String>,
        reference: ExecutionSeries,
        metric: Metric,
    ) -> Result<Self, ComparisonError> {
        let reference_name = reference_name.into();
        if reference.is_empty() {
            return Err(ComparisonError::EmptyReference {
                reference: reference_name,
            });
        }
        if let Some((position, expected, actual)) = reference.first_shape_mismatch() {
            return Err(ComparisonError::NonUniformReference {
                reference: reference_name,
                execution: position + 1,
                expected,
                actual,
            });
        }
        Ok(Self {
            reference_name,
            reference,
            metric,
        })
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    pub fn reference(&self) -> &ExecutionSeries {
        &self.reference
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Compares one candidate. The first failing execution aborts the
    /// candidate.
    pub fn compare(
        &self,
        candidate_name: &str,
        candidate: &ExecutionSeries,
    ) -> Result<ComparisonResult, ComparisonError> {
        if candidate.kind() != self.reference.kind() {
            return Err(ComparisonError::KindMismatch {
                expected: self.reference.kind(),
                actual: candidate.kind(),
            });
        }
        if candidate.len() != self.reference.len() {
            return Err(ComparisonError::ExecutionCountMismatch {
                expected: self.reference.len(),
                actual: candidate.len(),
            });
        }

        let values = self
            .reference
            .iter()
            .zip(candidate.iter())
            .enumerate()
            .map(|(position, (reference, candidate))| {
                self.metric
                    .evaluate(reference, candidate)
                    .map_err(|source| ComparisonError::Metric {
                        execution: position + 1,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ComparisonResult {
            candidate: candidate_name.to_string(),
            reference: self.reference_name.clone(),
            values,
        })
    }

    /// Compares every candidate in order, collecting skips instead of failing.
    pub fn compare_all<I>(&self, candidates: I) -> ComparisonReport
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut report = ComparisonReport::new(&self.reference_name, self.metric);
        for candidate in candidates {
            self.push_outcome(&mut report, &candidate.name, &candidate.series);
        }
        report
    }

    fn push_outcome(&self, report: &mut ComparisonReport, name: &str, series: &ExecutionSeries) {
        match self.compare(name, series) {
            Ok(result) => report.results.push(result),
            Err(e) => report.skip(name, &e),
        }
    }
}

/// Identifier of a dataset file: its name without extension.
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads a reference file and every candidate file and compares them.
///
/// A reference that cannot be loaded aborts the run. A candidate that cannot be
/// loaded is skipped like any other per-candidate failure.
pub fn compare_files<P: AsRef<Path>>(
    reference_path: &Path,
    candidate_paths: &[P],
    kind: DataKind,
    metric: Metric,
) -> Result<ComparisonReport, ComparisonError> {
    let reference_name = dataset_name(reference_path);
    let reference = load_series(reference_path, kind)?;
    let comparator = Comparator::new(reference_name, reference, metric)?;
    info!(
        "Comparing {} candidate(s) against '{}' with {}",
        candidate_paths.len(),
        comparator.reference_name(),
        metric
    );

    let mut report = ComparisonReport::new(comparator.reference_name(), metric);
    for path in candidate_paths {
        let path = path.as_ref();
        let name = dataset_name(path);
        match load_series(path, kind) {
            Ok(series) => comparator.push_outcome(&mut report, &name, &series),
            Err(e) => report.skip(&name, &ComparisonError::from(e)),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Matrix;

    fn reference() -> ExecutionSeries {
        ExecutionSeries::from_vectors(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
    }

    #[test]
    fn test_empty_reference_is_rejected() {
        let err = Comparator::new("ref", ExecutionSeries::empty(DataKind::Vector), Metric::Mse)
            .unwrap_err();
        assert_eq!(err.code(), "REFERENCE_EMPTY");
    }

    #[test]
    fn test_ragged_reference_is_rejected() {
        let ragged = ExecutionSeries::from_vectors(vec![vec![1.0, 2.0], vec![1.0]]);
        let err = Comparator::new("ref", ragged, Metric::Mse).unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::NonUniformReference { execution: 2, .. }
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let comparator = Comparator::new("ref", reference(), Metric::Mse).unwrap();
        let matrices = ExecutionSeries::from_matrices(vec![Matrix::zeros(1, 3), Matrix::zeros(1, 3)]);
        assert!(matches!(
            comparator.compare("m", &matrices),
            Err(ComparisonError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_skips_keep_input_order() {
        let comparator = Comparator::new("ref", reference(), Metric::Mse).unwrap();
        let report = comparator.compare_all(vec![
            Candidate::new("a", reference()),
            Candidate::new("short", ExecutionSeries::from_vectors(vec![vec![1.0, 2.0, 3.0]])),
            Candidate::new("b", reference()),
        ]);
        let names: Vec<&str> = report.results.iter().map(|r| r.candidate.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].code, "EXECUTION_COUNT_MISMATCH");
    }

    #[test]
    fn test_operation_label() {
        assert_eq!(operation_label("axpy_fp32"), "AXPY");
        assert_eq!(operation_label("pca_reimpl_fp16"), "PCA_REIMPL");
        assert_eq!(operation_label("pca_fp16"), "PCA");
        assert_eq!(operation_label("fft_fp32"), UNKNOWN_OPERATION);
    }
}
