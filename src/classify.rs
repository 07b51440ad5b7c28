//! Severity classification of metric values.
//!
//! A value is compared against a pair of thresholds with `>=`, critical first.
//! Thresholds are always passed in explicitly; nothing here reads settings.
//!
//! # Usage
//!
//! ```rust
//! use herakles_healthcheck::classify::{classify, Severity, ThresholdPolicy};
//!
//! assert_eq!(classify(75.0, 70.0, 90.0), Severity::Warn);
//!
//! let policy = ThresholdPolicy::with_cpu_critical(95.0);
//! assert_eq!(policy.cpu.classify(92.0), Severity::Warn);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One MiB in bytes, the unit of the network thresholds.
pub const MIB: f64 = 1024.0 * 1024.0;

/// Severity band of a classified value. Ordered so that `max` gives the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warn => "warn",
            Severity::Critical => "critical",
        }
    }

    /// Worst severity of an iterator, `Ok` when empty.
    pub fn worst<I: IntoIterator<Item = Severity>>(iter: I) -> Severity {
        iter.into_iter().max().unwrap_or(Severity::Ok)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Critical => "CRITICAL",
        })
    }
}

/// Classifies `value` against a warn and a critical level.
///
/// - `Critical` if `value >= critical`
/// - `Warn` if `value >= warn`
/// - otherwise `Ok`
pub fn classify(value: f64, warn: f64, critical: f64) -> Severity {
    if value >= critical {
        Severity::Critical
    } else if value >= warn {
        Severity::Warn
    } else {
        Severity::Ok
    }
}

/// A warn/critical pair for one metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub warn: f64,
    pub critical: f64,
}

impl Threshold {
    pub const fn new(warn: f64, critical: f64) -> Self {
        Self { warn, critical }
    }

    pub fn classify(&self, value: f64) -> Severity {
        classify(value, self.warn, self.critical)
    }
}

/// Thresholds for every metric kind shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPolicy {
    pub cpu: Threshold,
    pub load: Threshold,
    pub disk_util: Threshold,
    pub filesystem: Threshold,
    pub memory: Threshold,
    pub swap: Threshold,
    /// Bytes per second.
    pub network: Threshold,
}

pub const DEFAULT_CPU_WARN: f64 = 70.0;
pub const DEFAULT_CPU_CRITICAL: f64 = 90.0;

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            cpu: Threshold::new(DEFAULT_CPU_WARN, DEFAULT_CPU_CRITICAL),
            load: Threshold::new(75.0, 100.0),
            disk_util: Threshold::new(70.0, 90.0),
            filesystem: Threshold::new(75.0, 90.0),
            memory: Threshold::new(75.0, 90.0),
            swap: Threshold::new(50.0, 80.0),
            network: Threshold::new(10.0 * MIB, 100.0 * MIB),
        }
    }
}

impl ThresholdPolicy {
    /// Default policy with a user-chosen CPU critical level.
    pub fn with_cpu_critical(critical: f64) -> Self {
        let mut policy = Self::default();
        policy.cpu.critical = critical;
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_boundaries() {
        assert_eq!(classify(90.0, 70.0, 90.0), Severity::Critical);
        assert_eq!(classify(70.0, 70.0, 90.0), Severity::Warn);
        assert_eq!(classify(69.99, 70.0, 90.0), Severity::Ok);
    }

    #[test]
    fn test_critical_checked_first() {
        // Critical below warn still wins.
        assert_eq!(classify(60.0, 70.0, 50.0), Severity::Critical);
    }

    #[test]
    fn test_monotonic() {
        let mut last = Severity::Ok;
        for v in 0..=200 {
            let s = classify(v as f64, 75.0, 100.0);
            assert!(s >= last, "severity decreased at {}", v);
            last = s;
        }
        assert_eq!(last, Severity::Critical);
    }

    #[test]
    fn test_worst() {
        assert_eq!(Severity::worst([]), Severity::Ok);
        assert_eq!(
            Severity::worst([Severity::Warn, Severity::Ok, Severity::Critical]),
            Severity::Critical
        );
    }

    #[test]
    fn test_default_policy_matches_table() {
        let p = ThresholdPolicy::default();
        assert_eq!(p.cpu, Threshold::new(70.0, 90.0));
        assert_eq!(p.load, Threshold::new(75.0, 100.0));
        assert_eq!(p.swap, Threshold::new(50.0, 80.0));
        assert_eq!(p.network.critical, 100.0 * 1024.0 * 1024.0);
    }

    #[test]
    fn test_with_cpu_critical_only_touches_cpu() {
        let p = ThresholdPolicy::with_cpu_critical(80.0);
        assert_eq!(p.cpu, Threshold::new(70.0, 80.0));
        assert_eq!(p.memory, ThresholdPolicy::default().memory);
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
