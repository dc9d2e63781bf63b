//! Reduction and reporting utilities for benchmarks.

use super::benchmark_types::ScalingReport;
use super::timing_table::TimingTable;
use crate::metrics::format_float;

/// Median of `values`, averaging the two middle values for even counts.
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn format_cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.6}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Prints detailed scaling analysis
pub fn print_scaling_analysis(report: &ScalingReport) {
    println!("\n{}", "=".repeat(80));
    println!(
        "Scaling Results: {} ({} / {})",
        report.program,
        report.kernel,
        format!("{:?}", report.precision).to_lowercase()
    );
    println!("{}", "=".repeat(80));

    println!("\n💾 Memory Hierarchy:");
    println!(
        "   L1: {} B  L2: {} B  L3: {} B",
        report.profile.l1, report.profile.l2, report.profile.l3
    );
    println!(
        "   RAM tiers: {} B, {} B",
        report.profile.ram_tier1, report.profile.ram_tier2
    );

    let max_n = report.max_problem_size();
    println!("\n📏 Tier Thresholds (largest n = {}):", max_n);
    for threshold in &report.thresholds {
        let n = threshold
            .problem_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if threshold.is_reachable(max_n) {
            "✅"
        } else {
            "  "
        };
        println!("   {} {:<11} n={}", marker, threshold.name, n);
    }

    println!("\n📊 Median Timings:");
    let header: Vec<String> = (1..=report.timings.slots)
        .map(|slot| format!("{:>14}", format!("Tiempo_{}", slot)))
        .collect();
    println!("   {:>12}{}", "n", header.join(""));
    for sample in &report.timings.samples {
        let cells: Vec<String> = sample
            .medians
            .iter()
            .map(|&value| format!("{:>14}", format_cell(value)))
            .collect();
        println!("   {:>12}{}", sample.n, cells.join(""));
    }

    println!("\n{}", "=".repeat(80));
}

/// Prints a timing or speedup table
pub fn print_table(table: &TimingTable) {
    println!("{}", table.header().join("\t"));
    for row in table.rows() {
        let mut cells = vec![row.n.to_string()];
        cells.extend(row.values.iter().map(|value| match value {
            Some(v) => format_float(*v, 6),
            None => "-".to_string(),
        }));
        println!("{}", cells.join("\t"));
    }
}
