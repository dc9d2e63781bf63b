//! Rebuilding per-execution vectors and matrices from sparse CSV records.
//!
//! Input files carry one row per cell, tagged with a 1-based execution index and
//! either a position (`Ejecucion,Indice,Valor`) or a row/column pair
//! (`Ejecucion,Fila,Columna,Valor`). Reconstruction is a two-pass build: the first
//! pass fixes the shape bounds, the second allocates dense storage and scatters
//! every value into place. Cells that no record mentions stay at `0.0`.
//!
//! Vector lengths are bounded per execution. Matrix extents are bounded globally
//! across every execution in the file, so an execution that reports only part of
//! the grid is padded with zeros up to the largest extent seen.

use crate::errors::{ReconstructionError, ReconstructionResult};
use crate::series::{DataKind, ExecutionSeries, Matrix};
use csv::StringRecord;
use log::debug;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const EXECUTION_COLUMN: &str = "Ejecucion";
pub const INDEX_COLUMN: &str = "Indice";
pub const ROW_COLUMN: &str = "Fila";
pub const COLUMN_COLUMN: &str = "Columna";
pub const VALUE_COLUMN: &str = "Valor";

/// Upper bound on the dense values one file may expand to (2 GiB of `f64`).
pub const MAX_ELEMENTS: usize = 1 << 28;

/// One cell of a vector-mode file. Indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorRecord {
    pub execution: usize,
    pub index: usize,
    pub value: f64,
}

/// One cell of a matrix-mode file. Indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixRecord {
    pub execution: usize,
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Reads and reconstructs a series from a CSV file on disk.
pub fn load_series<P: AsRef<Path>>(path: P, kind: DataKind) -> ReconstructionResult<ExecutionSeries> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReconstructionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let series = parse_series(file, kind)?;
    debug!(
        "Loaded {} {} executions from {}",
        series.len(),
        kind,
        path.display()
    );
    Ok(series)
}

/// Reads and reconstructs a series from any CSV byte stream.
pub fn parse_series<R: Read>(reader: R, kind: DataKind) -> ReconstructionResult<ExecutionSeries> {
    match kind {
        DataKind::Vector => build_vector_series(&read_vector_records(reader)?),
        DataKind::Matrix => build_matrix_series(&read_matrix_records(reader)?),
    }
}

/// Parses `Ejecucion,Indice,Valor` rows.
pub fn read_vector_records<R: Read>(reader: R) -> ReconstructionResult<Vec<VectorRecord>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let execution_col = column_index(&headers, EXECUTION_COLUMN)?;
    let index_col = column_index(&headers, INDEX_COLUMN)?;
    let value_col = column_index(&headers, VALUE_COLUMN)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let line = line_of(&row);
        records.push(VectorRecord {
            execution: parse_index(&row, execution_col, EXECUTION_COLUMN, line)?,
            index: parse_index(&row, index_col, INDEX_COLUMN, line)?,
            value: parse_value(&row, value_col, line)?,
        });
    }
    Ok(records)
}

/// Parses `Ejecucion,Fila,Columna,Valor` rows.
pub fn read_matrix_records<R: Read>(reader: R) -> ReconstructionResult<Vec<MatrixRecord>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let execution_col = column_index(&headers, EXECUTION_COLUMN)?;
    let row_col = column_index(&headers, ROW_COLUMN)?;
    let col_col = column_index(&headers, COLUMN_COLUMN)?;
    let value_col = column_index(&headers, VALUE_COLUMN)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let line = line_of(&row);
        records.push(MatrixRecord {
            execution: parse_index(&row, execution_col, EXECUTION_COLUMN, line)?,
            row: parse_index(&row, row_col, ROW_COLUMN, line)?,
            col: parse_index(&row, col_col, COLUMN_COLUMN, line)?,
            value: parse_value(&row, value_col, line)?,
        });
    }
    Ok(records)
}

/// Builds one vector per execution; each vector is as long as the largest
/// position reported for that execution.
pub fn build_vector_series(records: &[VectorRecord]) -> ReconstructionResult<ExecutionSeries> {
    // First pass: execution count and per-execution length.
    let mut lengths: Vec<usize> = Vec::new();
    let mut seen: Vec<bool> = Vec::new();
    for (ordinal, record) in records.iter().enumerate() {
        let slot = execution_slot(record.execution, records.len(), ordinal)?;
        zero_based(record.index, INDEX_COLUMN, ordinal)?;
        check_extent(record.index, INDEX_COLUMN, ordinal)?;
        if slot >= lengths.len() {
            lengths.resize(slot + 1, 0);
            seen.resize(slot + 1, false);
        }
        seen[slot] = true;
        lengths[slot] = lengths[slot].max(record.index);
    }
    ensure_contiguous(&seen)?;

    if lengths.is_empty() {
        return Ok(ExecutionSeries::empty(DataKind::Vector));
    }
    let total = lengths
        .iter()
        .try_fold(0usize, |total, &len| total.checked_add(len));
    ensure_total(total)?;

    // Second pass: allocate and scatter.
    let mut vectors: Vec<Vec<f64>> = lengths.iter().map(|&len| vec![0.0; len]).collect();
    for record in records {
        vectors[record.execution - 1][record.index - 1] = record.value;
    }
    Ok(ExecutionSeries::from_vectors(vectors))
}

/// Builds one matrix per execution, all sharing the largest row and column
/// extents found anywhere in the input.
pub fn build_matrix_series(records: &[MatrixRecord]) -> ReconstructionResult<ExecutionSeries> {
    let mut rows = 0;
    let mut cols = 0;
    let mut seen: Vec<bool> = Vec::new();
    for (ordinal, record) in records.iter().enumerate() {
        let slot = execution_slot(record.execution, records.len(), ordinal)?;
        zero_based(record.row, ROW_COLUMN, ordinal)?;
        zero_based(record.col, COLUMN_COLUMN, ordinal)?;
        check_extent(record.row, ROW_COLUMN, ordinal)?;
        check_extent(record.col, COLUMN_COLUMN, ordinal)?;
        if slot >= seen.len() {
            seen.resize(slot + 1, false);
        }
        seen[slot] = true;
        rows = rows.max(record.row);
        cols = cols.max(record.col);
    }
    ensure_contiguous(&seen)?;

    if seen.is_empty() {
        return Ok(ExecutionSeries::empty(DataKind::Matrix));
    }
    ensure_total(
        rows.checked_mul(cols)
            .and_then(|cells| cells.checked_mul(seen.len())),
    )?;

    let mut matrices: Vec<Matrix> = (0..seen.len()).map(|_| Matrix::zeros(rows, cols)).collect();
    for record in records {
        matrices[record.execution - 1].set(record.row - 1, record.col - 1, record.value);
    }
    Ok(ExecutionSeries::from_matrices(matrices))
}

/// Writes one `Ejecucion,Indice,Valor` row per value, numbering executions and
/// positions from 1.
pub fn write_vector_records<W: Write>(writer: W, executions: &[Vec<f64>]) -> ReconstructionResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([EXECUTION_COLUMN, INDEX_COLUMN, VALUE_COLUMN])?;
    for (execution, values) in executions.iter().enumerate() {
        for (index, value) in values.iter().enumerate() {
            csv_writer.write_record(&[
                (execution + 1).to_string(),
                (index + 1).to_string(),
                value.to_string(),
            ])?;
        }
    }
    csv_writer.flush().map_err(|e| ReconstructionError::Csv(e.into()))?;
    Ok(())
}

/// Loads a plain whitespace-separated 1-D signal from disk.
pub fn load_signal<P: AsRef<Path>>(path: P) -> ReconstructionResult<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReconstructionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_signal(file)
}

/// Reads a plain whitespace-separated 1-D signal.
pub fn read_signal<R: Read>(mut reader: R) -> ReconstructionResult<Vec<f64>> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|source| ReconstructionError::Io {
            path: "<signal>".to_string(),
            source,
        })?;

    let mut signal = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = token
                .parse::<f64>()
                .map_err(|_| ReconstructionError::InvalidField {
                    line: line_idx as u64 + 1,
                    field: "signal".to_string(),
                    value: token.to_string(),
                })?;
            signal.push(value);
        }
    }
    Ok(signal)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column_index(headers: &StringRecord, name: &str) -> ReconstructionResult<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| ReconstructionError::MissingColumn {
            column: name.to_string(),
        })
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|position| position.line()).unwrap_or(0)
}

fn parse_index(row: &StringRecord, column: usize, field: &str, line: u64) -> ReconstructionResult<usize> {
    let raw = row.get(column).unwrap_or("");
    let index = raw
        .parse::<usize>()
        .map_err(|_| ReconstructionError::InvalidField {
            line,
            field: field.to_string(),
            value: raw.to_string(),
        })?;
    if index == 0 {
        return Err(ReconstructionError::ZeroIndex {
            line,
            field: field.to_string(),
        });
    }
    Ok(index)
}

fn parse_value(row: &StringRecord, column: usize, line: u64) -> ReconstructionResult<f64> {
    let raw = row.get(column).unwrap_or("");
    raw.parse::<f64>()
        .map_err(|_| ReconstructionError::InvalidField {
            line,
            field: VALUE_COLUMN.to_string(),
            value: raw.to_string(),
        })
}

/// Converts a 1-based index to 0-based. `ordinal` is the record's position in
/// the input; the reported line assumes one header line before it.
fn zero_based(index: usize, field: &str, ordinal: usize) -> ReconstructionResult<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| ReconstructionError::ZeroIndex {
            line: ordinal as u64 + 2,
            field: field.to_string(),
        })
}

/// Execution index as a 0-based slot. Executions are contiguous from 1, so an
/// index above the record count necessarily leaves a gap.
fn execution_slot(execution: usize, record_count: usize, ordinal: usize) -> ReconstructionResult<usize> {
    let slot = zero_based(execution, EXECUTION_COLUMN, ordinal)?;
    if execution > record_count {
        return Err(ReconstructionError::IndexOutOfRange {
            line: ordinal as u64 + 2,
            field: EXECUTION_COLUMN.to_string(),
            value: execution,
            limit: record_count,
        });
    }
    Ok(slot)
}

fn check_extent(index: usize, field: &str, ordinal: usize) -> ReconstructionResult<()> {
    if index > MAX_ELEMENTS {
        return Err(ReconstructionError::IndexOutOfRange {
            line: ordinal as u64 + 2,
            field: field.to_string(),
            value: index,
            limit: MAX_ELEMENTS,
        });
    }
    Ok(())
}

/// `None` means the element count overflowed `usize`.
fn ensure_total(total: Option<usize>) -> ReconstructionResult<()> {
    match total {
        Some(elements) if elements <= MAX_ELEMENTS => Ok(()),
        _ => Err(ReconstructionError::TooLarge { limit: MAX_ELEMENTS }),
    }
}

fn ensure_contiguous(seen: &[bool]) -> ReconstructionResult<()> {
    match seen.iter().position(|present| !present) {
        Some(slot) => Err(ReconstructionError::NonContiguousExecutions { missing: slot + 1 }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Execution;

    #[test]
    fn test_vector_length_is_per_execution() {
        let records = vec![
            VectorRecord { execution: 1, index: 1, value: 1.0 },
            VectorRecord { execution: 1, index: 3, value: 3.0 },
            VectorRecord { execution: 2, index: 1, value: 5.0 },
        ];
        let series = build_vector_series(&records).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(0), Some(&Execution::Vector(vec![1.0, 0.0, 3.0])));
        assert_eq!(series.get(1), Some(&Execution::Vector(vec![5.0])));
    }

    #[test]
    fn test_matrix_extent_is_global() {
        let records = vec![
            MatrixRecord { execution: 1, row: 1, col: 1, value: 1.0 },
            MatrixRecord { execution: 2, row: 2, col: 3, value: 7.0 },
        ];
        let series = build_matrix_series(&records).unwrap();
        for execution in &series {
            assert_eq!(execution.len(), 6);
        }
        match series.get(0) {
            Some(Execution::Matrix(m)) => {
                assert_eq!(m.get(0, 0), Some(1.0));
                assert_eq!(m.get(1, 2), Some(0.0));
            }
            other => panic!("unexpected execution: {:?}", other),
        }
    }

    #[test]
    fn test_records_out_of_order_are_sorted_by_execution() {
        let records = vec![
            VectorRecord { execution: 2, index: 1, value: 20.0 },
            VectorRecord { execution: 1, index: 1, value: 10.0 },
        ];
        let series = build_vector_series(&records).unwrap();
        assert_eq!(series.get(0).unwrap().values(), &[10.0]);
        assert_eq!(series.get(1).unwrap().values(), &[20.0]);
    }

    #[test]
    fn test_execution_gap_is_rejected() {
        let records = vec![
            VectorRecord { execution: 1, index: 1, value: 1.0 },
            VectorRecord { execution: 1, index: 2, value: 2.0 },
            VectorRecord { execution: 3, index: 1, value: 1.0 },
        ];
        let err = build_vector_series(&records).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::NonContiguousExecutions { missing: 2 }
        ));
    }

    #[test]
    fn test_oversized_matrix_is_rejected_before_allocation() {
        let records = vec![MatrixRecord {
            execution: 1,
            row: 1 << 20,
            col: 1 << 20,
            value: 1.0,
        }];
        let err = build_matrix_series(&records).unwrap_err();
        assert!(matches!(err, ReconstructionError::TooLarge { .. }));
    }

    #[test]
    fn test_execution_beyond_record_count_is_rejected() {
        let records = vec![VectorRecord {
            execution: usize::MAX,
            index: 1,
            value: 1.0,
        }];
        let err = build_vector_series(&records).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::IndexOutOfRange { limit: 1, .. }
        ));
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        let series = build_matrix_series(&[]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.kind(), DataKind::Matrix);
    }

    #[test]
    fn test_read_signal() {
        let signal = read_signal("1.0 2.5\n-3\n".as_bytes()).unwrap();
        assert_eq!(signal, vec![1.0, 2.5, -3.0]);
        assert!(read_signal("1.0 x".as_bytes()).is_err());
    }
}
