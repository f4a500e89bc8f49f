// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized acceptance thresholds with documented rationale.
//!
//! Every threshold the binaries check against is defined here — no ad-hoc
//! magic numbers at call sites. ULP figures are exact integers, so most
//! "tolerances" in this crate are counts rather than epsilons.

/// Number of exact-distance buckets in the ULP histogram.
///
/// Bucket `k` counts result elements exactly `k` bit patterns away from the
/// reference. 16 buckets cover the distances a healthy f32 GEMM produces;
/// anything past that is already captured by max-ULP and is individually
/// suspect, not census material.
pub const ULP_HISTOGRAM_BUCKETS: usize = 16;

/// Maximum acceptable ULP distance for the seeded uniform-`[0,1)` fill.
///
/// An f32 dot product of length `dim` against an f64 reference accumulates
/// on the order of `dim · ε_f32 ≈ dim · 1.2e-7` relative error, i.e. a few
/// hundred ULP at `dim = 1024`. 4096 gives headroom for unfavorable
/// rounding runs without masking a broken kernel (a wrong tile index is
/// wrong by millions of ULP, not thousands).
pub const GEMM_MAX_ULP_RANDOM: u64 = 4096;

/// Maximum acceptable relative error for the seeded uniform fill.
///
/// Same error model as [`GEMM_MAX_ULP_RANDOM`]: `dim · ε_f32` with margin.
/// Uniform `[0,1)` inputs keep every dot product O(dim), so catastrophic
/// cancellation cannot inflate the relative figure.
pub const GEMM_MAX_REL_ERR_RANDOM: f64 = 1e-3;

/// Maximum acceptable ULP distance for the all-ones fill: zero.
///
/// With both matrices filled with 1.0 every result element is exactly
/// `dim`, an integer representable exactly in f32 up to 2²⁴. Any nonzero
/// distance means the kernel summed the wrong number of terms.
pub const GEMM_MAX_ULP_ONES: u64 = 0;

/// Largest `dim` for which the all-ones result is exact in f32 (2²⁴).
pub const ONES_EXACT_DIM_LIMIT: usize = 1 << 24;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)] // constants sanity check
    fn histogram_size_is_sixteen() {
        assert_eq!(ULP_HISTOGRAM_BUCKETS, 16);
    }

    #[test]
    #[allow(clippy::assertions_on_constants)] // constants sanity check
    fn random_thresholds_leave_room_above_ones() {
        assert!(GEMM_MAX_ULP_RANDOM > GEMM_MAX_ULP_ONES);
        assert!(GEMM_MAX_REL_ERR_RANDOM > 0.0);
    }

    #[test]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn ones_limit_is_f32_exact_integer_range() {
        assert_eq!(ONES_EXACT_DIM_LIMIT, 16_777_216);
        // dim at the limit still round-trips through f32 exactly
        let as_f32 = ONES_EXACT_DIM_LIMIT as f32;
        assert_eq!(as_f32 as usize, ONES_EXACT_DIM_LIMIT);
    }
}
