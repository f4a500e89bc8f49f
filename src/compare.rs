// SPDX-License-Identifier: AGPL-3.0-only

//! Streaming error aggregation over (host reference, accelerator result)
//! pairs.
//!
//! A two-pass scorer would keep full per-element error vectors and locate
//! the worst entries with a second scan. [`ErrorStats`] streams instead:
//! one `observe` call per pair updates extrema, the mean accumulator, the
//! histogram, and the worst-case positions, in O(1) memory. Tie-breaking is
//! first-seen-wins (strict `>`), so the reported positions match what the
//! two-pass scan over retained vectors would have found.
//!
//! Partition-parallel use is supported through [`ErrorStats::merge`]:
//! splitting an index-ordered stream anywhere and merging the partial
//! aggregates reproduces the sequential result exactly, including argmax
//! indices and the overflow flag.

use crate::tolerances::ULP_HISTOGRAM_BUCKETS;
use crate::ulp;

/// Error metrics for a single (reference, candidate) pair.
#[derive(Debug, Clone, Copy)]
pub struct PairError {
    /// Raw bit-pattern distance, see [`ulp::ulp_distance`].
    pub ulp: u32,
    /// Relative error, possibly `+∞` or NaN for a zero reference.
    pub rel_err: f64,
}

/// Fixed-size census of small ULP distances.
///
/// Bucket `k` counts pairs whose distance is exactly `k`. Distances at or
/// beyond [`ULP_HISTOGRAM_BUCKETS`] fall outside every bucket — they still
/// feed min/max/mean in [`ErrorStats`], only the histogram drops them.
#[derive(Debug, Clone)]
pub struct UlpHistogram {
    buckets: [u64; ULP_HISTOGRAM_BUCKETS],
}

impl Default for UlpHistogram {
    fn default() -> Self {
        Self {
            buckets: [0; ULP_HISTOGRAM_BUCKETS],
        }
    }
}

impl UlpHistogram {
    /// Record one distance; distances ≥ bucket count are ignored.
    pub fn record(&mut self, distance: u64) {
        if let Ok(k) = usize::try_from(distance) {
            if k < self.buckets.len() {
                self.buckets[k] += 1;
            }
        }
    }

    /// Count in bucket `k` (distance exactly `k`).
    #[must_use]
    pub fn bucket(&self, k: usize) -> u64 {
        self.buckets[k]
    }

    /// All buckets in distance order.
    #[must_use]
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Total pairs captured by any bucket (≤ pairs observed).
    #[must_use]
    pub fn counted(&self) -> u64 {
        self.buckets.iter().sum()
    }

    fn merge(&mut self, other: &Self) {
        for (b, o) in self.buckets.iter_mut().zip(&other.buckets) {
            *b += o;
        }
    }
}

/// Streaming aggregates over a verification pass.
///
/// Create empty, call [`observe`](Self::observe) once per element in index
/// order, then read the accessors. All accessors that are meaningless
/// before the first observation return `None` instead of sentinel values.
#[derive(Debug, Clone)]
#[must_use]
pub struct ErrorStats {
    n: u64,
    min_ulp: u64,
    max_ulp: u64,
    ulp_sum: u64,
    sum_wrapped: bool,
    max_rel_err: f64,
    argmax_ulp: Option<usize>,
    argmax_rel: Option<usize>,
    histogram: UlpHistogram,
}

impl Default for ErrorStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorStats {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n: 0,
            min_ulp: u64::MAX,
            max_ulp: 0,
            ulp_sum: 0,
            sum_wrapped: false,
            max_rel_err: 0.0,
            argmax_ulp: None,
            argmax_rel: None,
            histogram: UlpHistogram::default(),
        }
    }

    /// Score one pair and fold it into the running aggregates.
    ///
    /// `reference` is narrowed to f32 before both metrics, matching the
    /// accelerator's precision. `index` is the element's row-major position
    /// and is retained only for worst-case reporting.
    pub fn observe(&mut self, reference: f64, candidate: f32, index: usize) -> PairError {
        #[allow(clippy::cast_possible_truncation)] // intentional f64 → f32 narrowing
        let reference32 = reference as f32;
        let pair = PairError {
            ulp: ulp::ulp_distance(reference32, candidate),
            rel_err: ulp::relative_error(reference32, candidate),
        };

        let distance = u64::from(pair.ulp);
        self.n += 1;
        self.min_ulp = self.min_ulp.min(distance);

        // First-seen-wins: strict '>' keeps the lowest index on ties. The
        // first observation seeds the argmax so an all-equal stream reports
        // index 0.
        if self.argmax_ulp.is_none() || distance > self.max_ulp {
            self.max_ulp = distance;
            self.argmax_ulp = Some(index);
        }

        // Sticky wrap detection: the sum keeps wrapping, it is not clamped.
        let (sum, wrapped) = self.ulp_sum.overflowing_add(distance);
        self.ulp_sum = sum;
        self.sum_wrapped |= wrapped;

        // NaN never wins (strict '>' is false), +∞ always wins over any
        // finite error. A stream with no comparable error leaves the argmax
        // unset rather than reporting NaN as a maximum.
        if !pair.rel_err.is_nan() && (self.argmax_rel.is_none() || pair.rel_err > self.max_rel_err)
        {
            self.max_rel_err = pair.rel_err;
            self.argmax_rel = Some(index);
        }

        self.histogram.record(distance);
        pair
    }

    /// Pairs observed so far.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// Smallest ULP distance, `None` before the first observation.
    #[must_use]
    pub fn min_ulp(&self) -> Option<u64> {
        (self.n > 0).then_some(self.min_ulp)
    }

    /// Largest ULP distance, `None` before the first observation.
    #[must_use]
    pub fn max_ulp(&self) -> Option<u64> {
        (self.n > 0).then_some(self.max_ulp)
    }

    /// Mean ULP distance (`sum / n`). `None` before the first observation.
    ///
    /// Meaningless when [`sum_wrapped`](Self::sum_wrapped) is set; callers
    /// must surface that caveat rather than trust the figure.
    #[must_use]
    pub fn mean_ulp(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)] // counters far below 2^52 in practice
        (self.n > 0).then(|| self.ulp_sum as f64 / self.n as f64)
    }

    /// Raw (possibly wrapped) ULP sum.
    #[must_use]
    pub const fn ulp_sum(&self) -> u64 {
        self.ulp_sum
    }

    /// Whether the ULP sum ever overflowed u64. Sticky; never cleared.
    #[must_use]
    pub const fn sum_wrapped(&self) -> bool {
        self.sum_wrapped
    }

    /// Largest comparable relative error, `None` if every observed error
    /// was NaN (or nothing was observed) — the explicit "no finite max"
    /// state. `Some(+∞)` when a zero reference met a non-zero candidate.
    #[must_use]
    pub fn max_rel_err(&self) -> Option<f64> {
        self.argmax_rel.map(|_| self.max_rel_err)
    }

    /// Index of the first pair achieving the maximum ULP distance.
    #[must_use]
    pub const fn argmax_ulp(&self) -> Option<usize> {
        self.argmax_ulp
    }

    /// Index of the first pair achieving the maximum relative error.
    #[must_use]
    pub const fn argmax_rel(&self) -> Option<usize> {
        self.argmax_rel
    }

    /// Histogram of small ULP distances.
    #[must_use]
    pub const fn histogram(&self) -> &UlpHistogram {
        &self.histogram
    }

    /// Fold the aggregates of a later, index-disjoint partition into this
    /// one.
    ///
    /// Equal extrema resolve to the lower index, and the merged sum
    /// re-checks overflow, so merging partials of an index-ordered split is
    /// indistinguishable from the sequential pass.
    #[allow(clippy::float_cmp)] // exact tie detection drives the index tie-break
    pub fn merge(&mut self, other: &Self) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other.clone();
            return;
        }

        self.n += other.n;
        self.min_ulp = self.min_ulp.min(other.min_ulp);

        if other.max_ulp > self.max_ulp {
            self.max_ulp = other.max_ulp;
            self.argmax_ulp = other.argmax_ulp;
        } else if other.max_ulp == self.max_ulp {
            self.argmax_ulp = match (self.argmax_ulp, other.argmax_ulp) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }

        match (self.argmax_rel, other.argmax_rel) {
            (None, Some(_)) => {
                self.max_rel_err = other.max_rel_err;
                self.argmax_rel = other.argmax_rel;
            }
            (Some(a), Some(b)) => {
                if other.max_rel_err > self.max_rel_err {
                    self.max_rel_err = other.max_rel_err;
                    self.argmax_rel = other.argmax_rel;
                } else if other.max_rel_err == self.max_rel_err {
                    self.argmax_rel = Some(a.min(b));
                }
            }
            _ => {}
        }

        let (sum, wrapped) = self.ulp_sum.overflowing_add(other.ulp_sum);
        self.ulp_sum = sum;
        self.sum_wrapped = self.sum_wrapped || other.sum_wrapped || wrapped;

        self.histogram.merge(&other.histogram);
    }

    /// Preload the raw sum (overflow-path tests; `observe` would need ~2³²
    /// max-distance pairs to get here honestly).
    #[cfg(test)]
    pub(crate) fn force_sum(&mut self, sum: u64) {
        self.ulp_sum = sum;
    }
}
