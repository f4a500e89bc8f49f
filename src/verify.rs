// SPDX-License-Identifier: AGPL-3.0-only

//! One-pass verification of an accelerator result against the host
//! reference, and the result-check report.
//!
//! The pass visits elements in row-major order 0..N−1, feeding each
//! accelerator value to the class census and each (reference, candidate,
//! index) triple to the error aggregator. Order matters only for
//! tie-breaking (first occurrence of an extremum wins), which is exactly
//! what the streaming aggregator preserves.

use crate::classify::FloatClassifier;
use crate::compare::ErrorStats;

/// The element behind a worst-case metric, resolved to matrix coordinates.
#[derive(Debug, Clone, Copy)]
pub struct WorstPair {
    /// Row-major index.
    pub index: usize,
    /// `index / dim`.
    pub row: usize,
    /// `index % dim`.
    pub col: usize,
    /// Host reference narrowed to f32 (the precision both metrics use).
    pub host: f32,
    /// Accelerator output.
    pub gpu: f32,
}

/// Everything the verification pass produces.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Matrix dimension (positions are reported as `(row, col)`).
    pub dim: usize,
    /// Class census of the accelerator output.
    pub classifier: FloatClassifier,
    /// Error aggregates over all pairs.
    pub stats: ErrorStats,
    /// Worst element by ULP distance, `None` for an empty input.
    pub worst_ulp: Option<WorstPair>,
    /// Worst element by relative error, `None` when no comparable error
    /// was observed (empty input or all-NaN errors).
    pub worst_rel: Option<WorstPair>,
}

/// Run the verification pass over a host/accelerator result pair.
///
/// # Panics
///
/// Panics if the two slices differ in length or are not `dim * dim` long.
#[must_use]
pub fn verify(host: &[f64], gpu: &[f32], dim: usize) -> VerifyReport {
    assert_eq!(host.len(), gpu.len(), "result buffers must match in length");
    assert_eq!(host.len(), dim * dim, "result buffers must be dim*dim");

    let mut classifier = FloatClassifier::new();
    let mut stats = ErrorStats::new();

    for (i, (&h, &g)) in host.iter().zip(gpu).enumerate() {
        classifier.eval(g);
        stats.observe(h, g, i);
    }

    #[allow(clippy::cast_possible_truncation)] // same narrowing the metrics use
    let resolve = |index: usize| WorstPair {
        index,
        row: index / dim,
        col: index % dim,
        host: host[index] as f32,
        gpu: gpu[index],
    };
    let worst_ulp = stats.argmax_ulp().map(resolve);
    let worst_rel = stats.argmax_rel().map(resolve);

    VerifyReport {
        dim,
        classifier,
        stats,
        worst_ulp,
        worst_rel,
    }
}

impl VerifyReport {
    /// Print the result-check report.
    ///
    /// Class counts with percentages, worst elements with positions and
    /// both values, min/max/mean ULP with the wrap caveat, and (optionally)
    /// the small-distance histogram.
    pub fn print(&self, show_histogram: bool) {
        println!();
        println!("Result check");

        println!();
        println!("  Floating-point class summary");
        let total = self.classifier.total();
        #[allow(clippy::cast_precision_loss)] // percentages only
        let pct = |count: u64| {
            if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            }
        };
        let c = &self.classifier;
        println!("    #NaNs:       {}\t({:.3} %)", c.nans(), pct(c.nans()));
        println!("    #infs:       {}\t({:.3} %)", c.infs(), pct(c.infs()));
        println!("    #normals:    {}\t({:.3} %)", c.normals(), pct(c.normals()));
        println!(
            "    #subnormals: {}\t({:.3} %)",
            c.subnormals(),
            pct(c.subnormals())
        );
        println!("    #zeros:      {}\t({:.3} %)", c.zeros(), pct(c.zeros()));
        if c.unknowns() > 0 {
            println!(
                "    #unknowns:   {}\t({:.3} %)",
                c.unknowns(),
                pct(c.unknowns())
            );
        }

        println!();
        println!("  Correctness");
        if let (Some(w), Some(max_ulp)) = (&self.worst_ulp, self.stats.max_ulp()) {
            println!(
                "    Max ULP distance: {max_ulp}  at position: ({}, {})  host: {}  gpu: {}",
                w.row, w.col, w.host, w.gpu
            );
        }
        if let (Some(min), Some(max), Some(mean)) = (
            self.stats.min_ulp(),
            self.stats.max_ulp(),
            self.stats.mean_ulp(),
        ) {
            print!("    ULP distance: min({min}) max({max}) mean({mean})");
            if self.stats.sum_wrapped() {
                print!("  [ERROR mean ulp wrapped!]");
            }
            println!();
        }

        match (&self.worst_rel, self.stats.max_rel_err()) {
            (Some(w), Some(max_rel)) => {
                println!(
                    "    Max relative error: {max_rel}  at position: ({}, {})  host: {}  gpu: {}",
                    w.row, w.col, w.host, w.gpu
                );
            }
            _ => println!("    Max relative error: no finite maximum (all errors NaN)"),
        }

        if show_histogram {
            println!();
            println!("  ULP histogram");
            let n = self.stats.n();
            #[allow(clippy::cast_precision_loss)] // percentages only
            for (k, &count) in self.stats.histogram().buckets().iter().enumerate() {
                let share = if n == 0 {
                    0.0
                } else {
                    100.0 * count as f64 / n as f64
                };
                println!("    {k:>2}  ULP:\t{count}\t({share:.3} %)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_possible_truncation)] // deliberate f64 → f32 narrowing
    fn narrow(host: &[f64]) -> Vec<f32> {
        host.iter().map(|&v| v as f32).collect()
    }

    #[test]
    fn identical_results_are_exact() {
        // Candidate identical to the reference (cast to f32): every metric
        // floors out and bucket 0 holds all four elements.
        let host = vec![1.5, 2.5, 3.5, 4.5];
        let gpu = narrow(&host);
        let report = verify(&host, &gpu, 2);

        assert_eq!(report.classifier.total(), 4);
        assert_eq!(report.classifier.normals(), 4);
        assert_eq!(report.stats.max_ulp(), Some(0));
        assert_eq!(report.stats.max_rel_err(), Some(0.0));
        assert_eq!(report.stats.histogram().bucket(0), 4);
    }

    #[test]
    fn mixed_class_scenario() {
        let host = vec![0.0, 1.0, -1.0, f64::INFINITY];
        let gpu = vec![0.0_f32, 1.0, -1.0, f32::INFINITY];
        let report = verify(&host, &gpu, 2);

        assert_eq!(report.classifier.zeros(), 1);
        assert_eq!(report.classifier.normals(), 2);
        assert_eq!(report.classifier.infs(), 1);
        assert_eq!(report.stats.max_ulp(), Some(0));
    }

    #[test]
    fn worst_pair_position_is_row_major() {
        let dim = 3;
        let host: Vec<f64> = (0..9).map(|i| f64::from(i) + 1.0).collect();
        let mut gpu = narrow(&host);
        // Perturb element (2, 1) = index 7 by three ULP.
        gpu[7] = f32::from_bits(gpu[7].to_bits() + 3);

        let report = verify(&host, &gpu, dim);
        let worst = report.worst_ulp.expect("worst pair exists");
        assert_eq!(worst.index, 7);
        assert_eq!((worst.row, worst.col), (2, 1));
        assert_eq!(report.stats.max_ulp(), Some(3));
        assert_eq!(report.stats.histogram().bucket(3), 1);
        assert_eq!(report.stats.histogram().bucket(0), 8);
    }

    #[test]
    fn zero_reference_dominates_relative_error() {
        // A tiny candidate against a zero reference is an infinite relative
        // error and must outrank every finite error in the batch.
        let host = vec![0.0, 2.0, 3.0, 4.0];
        let gpu = vec![1.0e-30_f32, 1.0, 3.0, 4.0];
        let report = verify(&host, &gpu, 2);

        assert_eq!(report.stats.max_rel_err(), Some(f64::INFINITY));
        let worst = report.worst_rel.expect("worst pair exists");
        assert_eq!(worst.index, 0);
    }

    #[test]
    fn all_nan_errors_report_no_finite_max() {
        let host = vec![1.0];
        let gpu = vec![f32::NAN];
        let report = verify(&host, &gpu, 1);

        assert_eq!(report.stats.max_rel_err(), None);
        assert!(report.worst_rel.is_none());
        assert_eq!(report.classifier.nans(), 1);
        // The ULP-side worst pair still exists: NaN is a bit pattern too.
        assert!(report.worst_ulp.is_some());
    }

    #[test]
    fn print_does_not_panic_on_edge_reports() {
        let report = verify(&[1.0], &[f32::NAN], 1);
        report.print(true);
        let empty = verify(&[], &[], 0);
        empty.print(true);
    }

    #[test]
    #[should_panic(expected = "result buffers must match in length")]
    fn mismatched_lengths_panic() {
        let _ = verify(&[1.0, 2.0], &[1.0], 1);
    }
}
