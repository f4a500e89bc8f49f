// SPDX-License-Identifier: AGPL-3.0-only

//! Pass/fail check harness for the validation binaries.
//!
//! Every validation binary follows the same pattern:
//!   - Explicit checks against documented expectations
//!   - Exit code 0 (all checks pass) or 1 (any check fails)
//!   - Machine-readable summary on stdout
//!
//! ULP distances and classifier counters are exact integers, so alongside
//! the usual float-tolerance checks the harness has an exact-count mode.

use std::process;

/// How a check's expectation is applied.
#[derive(Debug, Clone, Copy)]
pub enum CheckMode {
    /// |observed − expected| < tolerance
    Absolute,
    /// observed < threshold (upper bound only)
    UpperBound,
    /// observed == expected, exact integers
    Count,
    /// plain boolean outcome
    Bool,
}

impl std::fmt::Display for CheckMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::UpperBound => write!(f, "<"),
            Self::Count => write!(f, "=="),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// A single recorded check.
#[derive(Debug, Clone)]
pub struct Check {
    /// Human-readable label
    pub label: String,
    /// Whether this check passed
    pub passed: bool,
    /// Observed value (counts widened to f64 for display only)
    pub observed: f64,
    /// Expected value or threshold
    pub expected: f64,
    /// How the expectation was applied
    pub mode: CheckMode,
}

/// Accumulates checks and produces a summary with exit code.
#[derive(Debug, Default)]
#[must_use]
pub struct ValidationHarness {
    /// Name of the validation binary
    pub name: String,
    /// All checks performed
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    /// Create a harness for a named validation binary.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    /// Absolute tolerance check: |observed − expected| < tolerance.
    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        self.checks.push(Check {
            label: label.to_string(),
            passed: (observed - expected).abs() < tolerance,
            observed,
            expected,
            mode: CheckMode::Absolute,
        });
    }

    /// Upper-bound check: observed < threshold.
    pub fn check_upper(&mut self, label: &str, observed: f64, threshold: f64) {
        self.checks.push(Check {
            label: label.to_string(),
            passed: observed < threshold,
            observed,
            expected: threshold,
            mode: CheckMode::UpperBound,
        });
    }

    /// Exact integer equality (ULP distances, classifier counters).
    pub fn check_count(&mut self, label: &str, observed: u64, expected: u64) {
        #[allow(clippy::cast_precision_loss)] // display only
        self.checks.push(Check {
            label: label.to_string(),
            passed: observed == expected,
            observed: observed as f64,
            expected: expected as f64,
            mode: CheckMode::Count,
        });
    }

    /// Plain boolean check.
    pub fn check_bool(&mut self, label: &str, passed: bool) {
        self.checks.push(Check {
            label: label.to_string(),
            passed,
            observed: f64::from(u8::from(passed)),
            expected: 1.0,
            mode: CheckMode::Bool,
        });
    }

    /// Number of checks that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Total number of checks.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.checks.len()
    }

    /// Whether all checks passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    fn render(&self) -> String {
        use std::fmt::Write;
        let mut s = String::new();
        let _ = writeln!(
            s,
            "═══ {} validation: {}/{} checks passed ═══",
            self.name,
            self.passed_count(),
            self.total_count()
        );
        for check in &self.checks {
            let icon = if check.passed { "✓" } else { "✗" };
            let _ = match check.mode {
                CheckMode::Count => writeln!(
                    s,
                    "  {icon} {}: observed={:.0}, expected={:.0} ({})",
                    check.label, check.observed, check.expected, check.mode
                ),
                CheckMode::Bool => writeln!(s, "  {icon} {}", check.label),
                _ => writeln!(
                    s,
                    "  {icon} {}: observed={:.6e}, expected={:.6e} ({})",
                    check.label, check.observed, check.expected, check.mode
                ),
            };
        }
        s
    }

    /// Print summary and exit: 0 if all checks pass, 1 otherwise.
    pub fn finish(&self) -> ! {
        println!();
        print!("{}", self.render());
        if self.all_passed() {
            println!("ALL CHECKS PASSED");
            process::exit(0);
        }
        let failed: Vec<&str> = self
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.label.as_str())
            .collect();
        println!("FAILED CHECKS: {}", failed.join(", "));
        process::exit(1);
    }

    /// Summary as a string (for testing; `finish` prints and exits).
    #[cfg(test)]
    pub fn format_summary(&self) -> String {
        self.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_tracks_pass_fail() {
        let mut h = ValidationHarness::new("test");
        h.check_abs("exact", 1.0, 1.0, 1e-10);
        h.check_abs("close", 1.0001, 1.0, 1e-3);
        h.check_abs("far", 2.0, 1.0, 1e-3);
        assert_eq!(h.passed_count(), 2);
        assert_eq!(h.total_count(), 3);
        assert!(!h.all_passed());
    }

    #[test]
    fn count_check_is_exact() {
        let mut h = ValidationHarness::new("test");
        h.check_count("match", 42, 42);
        h.check_count("off_by_one", 42, 43);
        assert!(h.checks[0].passed);
        assert!(!h.checks[1].passed);
    }

    #[test]
    fn upper_bound_equal_fails() {
        let mut h = ValidationHarness::new("test");
        h.check_upper("below", 0.5, 1.0);
        h.check_upper("at", 1.0, 1.0);
        assert!(h.checks[0].passed);
        assert!(!h.checks[1].passed, "observed < threshold; equal fails");
    }

    #[test]
    fn bool_check() {
        let mut h = ValidationHarness::new("test");
        h.check_bool("ok", true);
        h.check_bool("bad", false);
        assert_eq!(h.passed_count(), 1);
    }

    #[test]
    fn empty_harness_vacuously_passes() {
        let h = ValidationHarness::new("empty");
        assert!(h.all_passed());
        assert_eq!(h.total_count(), 0);
    }

    #[test]
    fn format_summary_lists_every_check() {
        let mut h = ValidationHarness::new("verify_core");
        h.check_count("total", 4, 4);
        h.check_abs("mean", 0.0, 0.0, 1e-12);
        h.check_bool("wrapped flag", true);
        let s = h.format_summary();
        assert!(s.contains("verify_core"));
        assert!(s.contains("3/3"));
        assert!(s.contains("total"));
        assert!(s.contains("wrapped flag"));
        assert!(s.contains('✓'));
    }

    #[test]
    fn format_summary_marks_failures() {
        let mut h = ValidationHarness::new("test");
        h.check_count("bad count", 1, 2);
        let s = h.format_summary();
        assert!(s.contains('✗'));
        assert!(s.contains("0/1"));
    }
}
