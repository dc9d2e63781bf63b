//! Host cache and memory tier sizes.
//!
//! The profile is parsed from `lscpu`-style text. Each cache level is matched
//! independently; a level whose line is missing resolves to 0 bytes. When the
//! query itself fails the whole profile is replaced by [`CacheProfile::FALLBACK`].

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::process::Command;
use std::sync::OnceLock;

pub const KIB: f64 = 1024.0;
pub const MIB: f64 = 1024.0 * 1024.0;
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Multipliers from L3 size to the two RAM working-set ceilings.
const RAM_TIER1_FACTOR: f64 = 5.0;
const RAM_TIER2_FACTOR: f64 = 40.0;
const RAM_TIER1_DEFAULT: f64 = 64.0 * MIB;
const RAM_TIER2_DEFAULT: f64 = 512.0 * MIB;

/// Per-instance cache sizes and RAM ceilings, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheProfile {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
    pub ram_tier1: f64,
    pub ram_tier2: f64,
}

/// A cumulative memory boundary: everything up to and including one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheTier {
    pub name: &'static str,
    pub bytes: f64,
}

fn level_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ["L1d", "L2", "L3"].map(|label| {
            Regex::new(&format!(
                r"{label}(?: cache)?:\s+([\d.]+)\s*([KMG]iB)?\s+\((\d+) instances?\)"
            ))
            .expect("built-in cache pattern must compile")
        })
    })
}

/// Per-instance size in bytes of the first level matched by `pattern`, or 0.
fn parse_level(text: &str, pattern: &Regex) -> f64 {
    let Some(captures) = pattern.captures(text) else {
        return 0.0;
    };
    let Ok(size) = captures[1].parse::<f64>() else {
        debug!("Unparseable cache size '{}'", &captures[1]);
        return 0.0;
    };
    let multiplier = match captures.get(2).map(|unit| unit.as_str()) {
        Some("KiB") => KIB,
        Some("MiB") => MIB,
        Some("GiB") => GIB,
        _ => 1.0,
    };
    match captures[3].parse::<u32>() {
        Ok(instances) if instances > 0 => size * multiplier / instances as f64,
        _ => 0.0,
    }
}

impl CacheProfile {
    /// Used when cache topology cannot be queried at all.
    pub const FALLBACK: CacheProfile = CacheProfile {
        l1: 48.0 * KIB,
        l2: 1.25 * MIB,
        l3: 12.0 * MIB,
        ram_tier1: RAM_TIER1_DEFAULT,
        ram_tier2: RAM_TIER2_DEFAULT,
    };

    /// Builds a profile from detected per-instance cache sizes. RAM ceilings
    /// scale with L3, or take fixed values when L3 is unknown.
    pub fn from_levels(l1: f64, l2: f64, l3: f64) -> Self {
        let (ram_tier1, ram_tier2) = if l3 > 0.0 {
            (RAM_TIER1_FACTOR * l3, RAM_TIER2_FACTOR * l3)
        } else {
            (RAM_TIER1_DEFAULT, RAM_TIER2_DEFAULT)
        };
        Self {
            l1,
            l2,
            l3,
            ram_tier1,
            ram_tier2,
        }
    }

    /// Parses hardware description text such as `lscpu` output.
    pub fn from_description(text: &str) -> Self {
        let [l1, l2, l3] = level_patterns();
        let profile = Self::from_levels(
            parse_level(text, l1),
            parse_level(text, l2),
            parse_level(text, l3),
        );
        if profile.l1 == 0.0 || profile.l2 == 0.0 || profile.l3 == 0.0 {
            warn!(
                "Partial cache detection: L1={} L2={} L3={} bytes",
                profile.l1, profile.l2, profile.l3
            );
        }
        profile
    }

    /// Runs `query` and parses its output, falling back to [`Self::FALLBACK`]
    /// when the query fails.
    pub fn from_query<F>(query: F) -> Self
    where
        F: FnOnce() -> io::Result<String>,
    {
        match query() {
            Ok(text) => Self::from_description(&text),
            Err(e) => {
                warn!("Cache topology query failed ({}), using default profile", e);
                Self::FALLBACK
            }
        }
    }

    /// Detects the host profile through `lscpu`.
    pub fn detect() -> Self {
        Self::from_query(query_lscpu)
    }

    /// Cumulative tier boundaries, smallest first.
    pub fn tiers(&self) -> Vec<CacheTier> {
        let caches = self.l1 + self.l2 + self.l3;
        vec![
            CacheTier {
                name: "L1",
                bytes: self.l1,
            },
            CacheTier {
                name: "L2",
                bytes: self.l1 + self.l2,
            },
            CacheTier {
                name: "L3",
                bytes: caches,
            },
            CacheTier {
                name: "RAM 64MiB",
                bytes: caches + self.ram_tier1,
            },
            CacheTier {
                name: "RAM 512MiB",
                bytes: caches + self.ram_tier2,
            },
        ]
    }
}

fn query_lscpu() -> io::Result<String> {
    let output = Command::new("lscpu").output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "lscpu exited with {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
