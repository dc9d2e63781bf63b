//! Size and time ratios.

use crate::errors::{MetricError, MetricResult};

fn ratio_of_sizes(original: usize, compressed: usize) -> MetricResult<f64> {
    if compressed == 0 {
        return Err(MetricError::DivisionByZero {
            metric: "compression ratio",
        });
    }
    Ok(original as f64 / compressed as f64)
}

/// Compression ratio by element count.
pub fn compression_ratio(original: &[f64], compressed: &[f64]) -> MetricResult<f64> {
    ratio_of_sizes(original.len(), compressed.len())
}

/// Compression ratio of two encoded streams by byte length.
pub fn stream_compression_ratio(original: &[u8], compressed: &[u8]) -> MetricResult<f64> {
    ratio_of_sizes(original.len(), compressed.len())
}

/// `baseline_time / new_time`. A zero new time is an error.
pub fn speedup(baseline_time: f64, new_time: f64) -> MetricResult<f64> {
    if new_time == 0.0 {
        return Err(MetricError::DivisionByZero { metric: "speedup" });
    }
    Ok(baseline_time / new_time)
}
