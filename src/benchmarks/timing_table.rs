//! Timing tables on disk: `n,Tiempo_1,...,Tiempo_k`.
//!
//! One row per problem size. An empty cell is an absent value and stays absent
//! through every aggregation.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::performance_metrics::median;
use super::timing_harness::TimingReport;
use crate::metrics::speedup;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const SIZE_COLUMN: &str = "n";
pub const TIME_PREFIX: &str = "Tiempo";
pub const SPEEDUP_PREFIX: &str = "Speedup";

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub n: usize,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

fn numbered_columns(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}_{}", prefix, i)).collect()
}

impl TimingTable {
    /// An empty table with `count` value columns named `<prefix>_1..<prefix>_count`.
    pub fn with_prefix(prefix: &str, count: usize) -> Self {
        Self {
            columns: numbered_columns(prefix, count),
            rows: Vec::new(),
        }
    }

    pub fn from_report(report: &TimingReport) -> Self {
        Self {
            columns: numbered_columns(TIME_PREFIX, report.slots),
            rows: report
                .samples
                .iter()
                .map(|sample| TableRow {
                    n: sample.n,
                    values: sample.medians.clone(),
                })
                .collect(),
        }
    }

    /// Full header including the size column.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![SIZE_COLUMN.to_string()];
        header.extend(self.columns.iter().cloned());
        header
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Appends a row, which must have one value per column.
    pub fn push_row(&mut self, n: usize, values: Vec<Option<f64>>) -> BenchmarkResult<()> {
        if values.len() != self.columns.len() {
            return Err(BenchmarkError::TableMismatch {
                message: format!(
                    "row for n={} has {} values, expected {}",
                    n,
                    values.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(TableRow { n, values });
        Ok(())
    }

    /// Parses a table. `source` names the input in error messages.
    pub fn read<R: Read>(reader: R, source: &str) -> BenchmarkResult<Self> {
        let malformed = |message: String| BenchmarkError::MalformedTable {
            path: source.to_string(),
            message,
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| malformed(e.to_string()))?
            .clone();
        if headers.get(0) != Some(SIZE_COLUMN) {
            return Err(malformed(format!(
                "first column must be '{}'",
                SIZE_COLUMN
            )));
        }

        let mut table = Self {
            columns: headers.iter().skip(1).map(str::to_string).collect(),
            rows: Vec::new(),
        };
        for record in csv_reader.records() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let n = record
                .get(0)
                .unwrap_or("")
                .parse::<usize>()
                .map_err(|_| malformed(format!("line {}: invalid size", line)))?;
            let values = record
                .iter()
                .skip(1)
                .map(|cell| {
                    if cell.is_empty() {
                        Ok(None)
                    } else {
                        cell.parse::<f64>()
                            .map(Some)
                            .map_err(|_| malformed(format!("line {}: invalid value '{}'", line, cell)))
                    }
                })
                .collect::<BenchmarkResult<Vec<_>>>()?;
            table.rows.push(TableRow { n, values });
        }
        Ok(table)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> BenchmarkResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::read(file, &path.display().to_string())
    }

    /// Writes the table; absent values become empty cells.
    pub fn write<W: Write>(&self, writer: W) -> BenchmarkResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![row.n.to_string()];
            record.extend(
                row.values
                    .iter()
                    .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> BenchmarkResult<()> {
        self.write(File::create(path)?)
    }
}

/// Per-cell median across tables with identical headers, grouped by `n`.
pub fn median_of_tables(tables: &[TimingTable]) -> BenchmarkResult<TimingTable> {
    let first = tables.first().ok_or_else(|| BenchmarkError::TableMismatch {
        message: "at least one table is required".to_string(),
    })?;
    if let Some(position) = tables.iter().position(|table| table.columns != first.columns) {
        return Err(BenchmarkError::TableMismatch {
            message: format!("header of table {} differs from the first", position + 1),
        });
    }

    let width = first.columns.len();
    let mut grouped: BTreeMap<usize, Vec<Vec<f64>>> = BTreeMap::new();
    for row in tables.iter().flat_map(|table| table.rows.iter()) {
        if row.values.len() != width {
            return Err(BenchmarkError::TableMismatch {
                message: format!("row for n={} has {} values", row.n, row.values.len()),
            });
        }
        let columns = grouped.entry(row.n).or_insert_with(|| vec![Vec::new(); width]);
        for (column, value) in columns.iter_mut().zip(&row.values) {
            if let Some(v) = value {
                column.push(*v);
            }
        }
    }

    let rows = grouped
        .into_iter()
        .map(|(n, columns)| TableRow {
            n,
            values: columns.iter().map(|values| median(values)).collect(),
        })
        .collect();
    Ok(TimingTable {
        columns: first.columns.clone(),
        rows,
    })
}

/// Row-by-row `baseline / new` speedups. Both tables must list the same sizes
/// in the same order with the same number of columns.
pub fn speedup_table(baseline: &TimingTable, new: &TimingTable) -> BenchmarkResult<TimingTable> {
    if baseline.rows.len() != new.rows.len() {
        return Err(BenchmarkError::TableMismatch {
            message: format!(
                "different number of rows ({} vs {})",
                baseline.rows.len(),
                new.rows.len()
            ),
        });
    }

    let mut table = TimingTable::with_prefix(SPEEDUP_PREFIX, baseline.columns.len());
    for (base_row, new_row) in baseline.rows.iter().zip(&new.rows) {
        if base_row.n != new_row.n {
            return Err(BenchmarkError::TableMismatch {
                message: format!("sizes differ: {} vs {}", base_row.n, new_row.n),
            });
        }
        if base_row.values.len() != new_row.values.len() {
            return Err(BenchmarkError::TableMismatch {
                message: format!("column count differs for n={}", base_row.n),
            });
        }
        let values = base_row
            .values
            .iter()
            .zip(&new_row.values)
            .map(|pair| match pair {
                (Some(base_time), Some(new_time)) => speedup(*base_time, *new_time).map(Some),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(base_row.n, values)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> TimingTable {
        TimingTable::read(csv.as_bytes(), "test").unwrap()
    }

    #[test]
    fn test_empty_cells_are_absent() {
        let t = table("n,Tiempo_1,Tiempo_2\n10,0.5,\n");
        assert_eq!(t.rows()[0].values, vec![Some(0.5), None]);

        let mut out = Vec::new();
        t.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "n,Tiempo_1,Tiempo_2\n10,0.5,\n");
    }

    #[test]
    fn test_median_groups_by_size() {
        let a = table("n,Tiempo_1\n20,4.0\n10,1.0\n");
        let b = table("n,Tiempo_1\n10,3.0\n20,\n");
        let merged = median_of_tables(&[a, b]).unwrap();
        assert_eq!(merged.rows()[0], TableRow { n: 10, values: vec![Some(2.0)] });
        assert_eq!(merged.rows()[1], TableRow { n: 20, values: vec![Some(4.0)] });
    }

    #[test]
    fn test_median_rejects_different_headers() {
        let a = table("n,Tiempo_1\n10,1.0\n");
        let b = table("n,Tiempo_1,Tiempo_2\n10,1.0,2.0\n");
        assert!(matches!(
            median_of_tables(&[a, b]),
            Err(BenchmarkError::TableMismatch { .. })
        ));
    }

    #[test]
    fn test_speedup_table() {
        let base = table("n,Tiempo_1,Tiempo_2\n10,4.0,\n");
        let new = table("n,Tiempo_1,Tiempo_2\n10,2.0,1.0\n");
        let result = speedup_table(&base, &new).unwrap();
        assert_eq!(result.header(), vec!["n", "Speedup_1", "Speedup_2"]);
        assert_eq!(result.rows()[0].values, vec![Some(2.0), None]);
    }

    #[test]
    fn test_speedup_zero_time_fails() {
        let base = table("n,Tiempo_1\n10,4.0\n");
        let new = table("n,Tiempo_1\n10,0\n");
        assert_eq!(
            speedup_table(&base, &new).unwrap_err().code(),
            "DIVISION_BY_ZERO"
        );
    }

    #[test]
    fn test_speedup_rejects_size_mismatch() {
        let base = table("n,Tiempo_1\n10,4.0\n");
        let new = table("n,Tiempo_1\n20,4.0\n");
        assert!(speedup_table(&base, &new).is_err());
    }
}
