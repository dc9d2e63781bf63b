//! Tests for cache detection, tier calibration and timing tables.

use kernel_fidelity::benchmarks::calibration::tier_thresholds;
use kernel_fidelity::benchmarks::timing_table::{median_of_tables, speedup_table};
use kernel_fidelity::benchmarks::{
    CacheProfile, Kernel, MemoryModel, Precision, TimingTable, problem_size_for_budget,
};
use std::io;
use tempfile::TempDir;

const DELTA: f64 = 1e-9;

const LSCPU: &str = "Architecture:            x86_64\n\
Caches (sum of all):\n\
  L1d:                    32 KiB (1 instance)\n\
  L1i:                    32 KiB (1 instance)\n\
  L2:                     1 MiB (1 instance)\n\
  L3:                     8 MiB (1 instance)\n";

#[cfg(test)]
mod cache_tests {
    use super::*;

    #[test]
    fn test_lscpu_description() {
        let profile = CacheProfile::from_description(LSCPU);
        assert_eq!(profile.l1, 32768.0);
        assert_eq!(profile.l2, 1048576.0);
        assert_eq!(profile.l3, 8388608.0);
        assert_eq!(profile.ram_tier1, 41943040.0);
        assert_eq!(profile.ram_tier2, 335544320.0);
    }

    #[test]
    fn test_per_instance_sizes() {
        let text = "L1d: 384 KiB (8 instances)\nL2: 8 MiB (8 instances)\nL3: 32 MiB (1 instance)\n";
        let profile = CacheProfile::from_description(text);
        assert_eq!(profile.l1, 48.0 * 1024.0);
        assert_eq!(profile.l2, 1024.0 * 1024.0);
    }

    #[test]
    fn test_failed_query_uses_fallback() {
        let profile = CacheProfile::from_query(|| Err(io::Error::other("no lscpu")));
        assert_eq!(profile, CacheProfile::FALLBACK);
    }

    #[test]
    fn test_tiers_are_cumulative() {
        let profile = CacheProfile::from_description(LSCPU);
        let bytes: Vec<f64> = profile.tiers().iter().map(|t| t.bytes).collect();
        assert!(bytes.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(bytes[2], 32768.0 + 1048576.0 + 8388608.0);
    }
}

#[cfg(test)]
mod calibration_tests {
    use super::*;

    #[test]
    fn test_budget_to_size() {
        assert_eq!(
            problem_size_for_budget(32768.0, Precision::Single, MemoryModel::Linear).unwrap(),
            4096
        );
        assert_eq!(
            problem_size_for_budget(32768.0, Precision::Half, MemoryModel::Linear).unwrap(),
            8192
        );
        assert_eq!(
            problem_size_for_budget(32768.0, Precision::Single, MemoryModel::Quadratic).unwrap(),
            45
        );
        assert_eq!(
            problem_size_for_budget(1152.0, Precision::Single, MemoryModel::KernelAugmentedLinear)
                .unwrap(),
            128
        );
    }

    #[test]
    fn test_thresholds_follow_kernel_model() {
        let profile = CacheProfile::from_description(LSCPU);
        let linear = tier_thresholds(&profile, Precision::Single, Kernel::Dct.memory_model());
        let quadratic = tier_thresholds(&profile, Precision::Single, Kernel::Pca.memory_model());
        assert_eq!(linear[0].problem_size, Some(4096));
        assert_eq!(quadratic[0].problem_size, Some(45));
        assert!(linear.iter().all(|t| t.problem_size.is_some()));
    }

    #[test]
    fn test_kernel_from_program_name() {
        assert_eq!(Kernel::from_program_name("pca_reimpl_FP16"), Some(Kernel::PcaReimpl));
        assert_eq!(Kernel::from_program_name("dwt_1d_fp32"), Some(Kernel::Dwt1d));
        assert_eq!(Precision::from_program_name("axpy_FP16_ARM"), Precision::Half);
        assert_eq!(Precision::from_program_name("axpy"), Precision::Single);
    }
}

#[cfg(test)]
mod timing_table_tests {
    use super::*;

    fn table(text: &str) -> TimingTable {
        TimingTable::read(text.as_bytes(), "test").unwrap()
    }

    #[test]
    fn test_median_of_three_runs() {
        let runs = [
            table("n,Tiempo_1\n8,1.0\n16,2.0\n"),
            table("n,Tiempo_1\n8,3.0\n16,\n"),
            table("n,Tiempo_1\n8,2.0\n16,4.0\n"),
        ];
        let merged = median_of_tables(&runs).unwrap();
        let rows = merged.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values, vec![Some(2.0)]);
        assert_eq!(rows[1].values, vec![Some(3.0)]);
    }

    #[test]
    fn test_speedup_keeps_gaps() {
        let base = table("n,Tiempo_1,Tiempo_2\n8,1.0,\n");
        let new = table("n,Tiempo_1,Tiempo_2\n8,0.25,0.5\n");
        let speedups = speedup_table(&base, &new).unwrap();
        assert!(speedups.columns()[0].starts_with("Speedup"));
        let values = &speedups.rows()[0].values;
        assert!((values[0].unwrap() - 4.0).abs() < DELTA);
        assert_eq!(values[1], None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("times.csv");
        let original = table("n,Tiempo_1\n8,0.5\n16,\n");
        original.save(&path).unwrap();
        assert_eq!(TimingTable::load(&path).unwrap(), original);
    }
}
