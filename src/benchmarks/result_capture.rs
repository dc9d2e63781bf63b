//! Capture of per-element kernel results.
//!
//! Run with the verbosity flag, a kernel prints one line per execution holding
//! the result marker and `n` whitespace-separated values. Captured results are
//! stored in the `Ejecucion,Indice,Valor` layout the comparison side reads.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::HarnessConfig;
use super::timing_harness::{BenchmarkProgram, Invocation};
use crate::reconstruction::write_vector_records;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Parses every result line of `output`. Each line must hold exactly `n` values.
pub fn parse_results(output: &str, marker: &str, n: usize) -> BenchmarkResult<Vec<Vec<f64>>> {
    let mut executions = Vec::new();
    for line in output.lines() {
        let Some(at) = line.find(marker) else {
            continue;
        };
        let rest = line[at + marker.len()..].trim_start().trim_start_matches(':');
        let values = rest
            .split_whitespace()
            .map(|token| token.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| BenchmarkError::MalformedResult {
                line: line.to_string(),
            })?;
        if values.len() != n {
            return Err(BenchmarkError::ResultCountMismatch {
                line: executions.len() + 1,
                expected: n,
                actual: values.len(),
            });
        }
        executions.push(values);
    }
    Ok(executions)
}

/// Runs `program` once at `n` and returns one vector per reported execution.
pub fn capture_results<P: BenchmarkProgram>(
    program: &P,
    n: usize,
    config: &HarnessConfig,
) -> BenchmarkResult<Vec<Vec<f64>>> {
    let output = program.run(&Invocation {
        n,
        seed: config.seed,
        verbose: true,
        timeout: None,
    })?;
    let executions = parse_results(&output, &config.result_marker, n)?;
    if executions.is_empty() {
        return Err(BenchmarkError::NoResults {
            program: program.name().to_string(),
        });
    }
    info!(
        "n={}: {} execution(s) captured from '{}'",
        n,
        executions.len(),
        program.name()
    );
    Ok(executions)
}

/// Writes captured executions as `Ejecucion,Indice,Valor` rows.
pub fn write_results<W: Write>(writer: W, executions: &[Vec<f64>]) -> BenchmarkResult<()> {
    write_vector_records(writer, executions)?;
    Ok(())
}

/// Default output name: `<program stem>_n<n>_seed<seed>.csv`.
pub fn capture_file_name(program_name: &str, n: usize, seed: u64) -> String {
    let stem = Path::new(program_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| program_name.to_string());
    format!("{}_n{}_seed{}.csv", stem, n, seed)
}

/// Captures results and saves them to `path`. Returns the execution count.
pub fn capture_to_file<P: BenchmarkProgram, Q: AsRef<Path>>(
    program: &P,
    n: usize,
    config: &HarnessConfig,
    path: Q,
) -> BenchmarkResult<usize> {
    let executions = capture_results(program, n, config)?;
    let file = File::create(path.as_ref())?;
    write_results(BufWriter::new(file), &executions)?;
    info!("Results saved to {}", path.as_ref().display());
    Ok(executions.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Resultados ejecucion";

    #[test]
    fn test_parse_results() {
        let output = "Tiempo de ejecucion: 0.1\nResultados ejecucion: 1 2 3\nResultados ejecucion: 4 5 6\n";
        let executions = parse_results(output, MARKER, 3).unwrap();
        assert_eq!(executions, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let output = "Resultados ejecucion: 1 2 3\nResultados ejecucion: 4 5\n";
        let err = parse_results(output, MARKER, 3).unwrap_err();
        assert!(matches!(
            err,
            BenchmarkError::ResultCountMismatch {
                line: 2,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_capture_file_name() {
        assert_eq!(capture_file_name("axpy_FP32", 1024, 1234), "axpy_FP32_n1024_seed1234.csv");
    }
}
