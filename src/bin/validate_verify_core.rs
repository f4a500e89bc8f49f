// SPDX-License-Identifier: AGPL-3.0-only

//! Verification-core validation: classifier, ULP metrics, aggregates.
//!
//! CPU-only — no GPU required. Exercises the float classifier, the
//! bit-distance primitives, and the streaming error aggregates against
//! hand-computable scenarios:
//!   - classification totality and count-sum invariant
//!   - ULP distance identities, symmetry, and the signed-zero quirk
//!   - histogram bucketing and the ≥16 drop rule
//!   - sticky mean-sum overflow, including re-detection at merge time
//!   - NaN-never-wins / +∞-always-wins relative-error tracking
//!   - exactness of the all-ones GEMM pipeline
//!
//! Exit code 0 = all checks pass, 1 = any check failed.

use cannonade::classify::{FloatClass, FloatClassifier};
use cannonade::compare::ErrorStats;
use cannonade::cpu_reference;
use cannonade::tolerances::ULP_HISTOGRAM_BUCKETS;
use cannonade::ulp::{relative_error, ulp_distance};
use cannonade::validation::ValidationHarness;
use cannonade::verify::verify;
use cannonade::{bench, gpu};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Verification Core Validation                                ║");
    println!("║  Classifier, ULP distance, error aggregates — CPU only       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("verify_core");

    check_classifier(&mut harness);
    check_ulp_distance(&mut harness);
    check_relative_error(&mut harness);
    check_histogram(&mut harness);
    check_overflow(&mut harness);
    check_ones_gemm(&mut harness);
    check_throughput_math(&mut harness);

    harness.finish();
}

fn check_classifier(harness: &mut ValidationHarness) {
    println!("═══ Phase 1: Float classifier ════════════════════════════════");

    // One value per headline category.
    let mut census = FloatClassifier::new();
    for v in [0.0_f32, 1.0, -1.0, f32::INFINITY] {
        census.eval(v);
    }
    harness.check_count("census: zeros", census.zeros(), 1);
    harness.check_count("census: normals", census.normals(), 2);
    harness.check_count("census: infs", census.infs(), 1);
    harness.check_count("census: total", census.total(), 4);

    // Totality over boundary bit patterns: the sum invariant must hold at
    // every step and nothing may land in Unknown on IEEE-754 hardware.
    let boundary_patterns: &[u32] = &[
        0x0000_0000,
        0x8000_0000,
        0x0000_0001,
        0x007f_ffff,
        0x0080_0000,
        0x7f7f_ffff,
        0x7f80_0000,
        0xff80_0000,
        0x7f80_0001,
        0x7fc0_0000,
        0xffff_ffff,
    ];
    let mut boundary = FloatClassifier::new();
    let mut sum_invariant = true;
    for &bits in boundary_patterns {
        boundary.eval(f32::from_bits(bits));
        let sum = boundary.zeros()
            + boundary.subnormals()
            + boundary.normals()
            + boundary.infs()
            + boundary.nans()
            + boundary.unknowns();
        sum_invariant &= sum == boundary.total();
    }
    harness.check_bool("category sum == total at every step", sum_invariant);
    harness.check_count(
        "boundary patterns: total",
        boundary.total(),
        boundary_patterns.len() as u64,
    );
    harness.check_count("boundary patterns: unknowns", boundary.unknowns(), 0);
    harness.check_bool(
        "negative NaN classifies as NaN",
        FloatClass::from_bits(0xffc0_0000) == FloatClass::Nan,
    );
    println!("  classified {} boundary patterns", boundary_patterns.len());
    println!();
}

fn check_ulp_distance(harness: &mut ValidationHarness) {
    println!("═══ Phase 2: ULP distance ════════════════════════════════════");

    harness.check_count("ulp(a, a) == 0", u64::from(ulp_distance(1.0, 1.0)), 0);
    harness.check_count(
        "ulp(-0, -0) == 0",
        u64::from(ulp_distance(-0.0, -0.0)),
        0,
    );
    harness.check_bool(
        "ulp symmetry",
        ulp_distance(1.0, 1.5) == ulp_distance(1.5, 1.0),
    );
    harness.check_count(
        "adjacent values are 1 ULP apart",
        u64::from(ulp_distance(1.0, f32::from_bits(1.0_f32.to_bits() + 1))),
        1,
    );
    // The documented quirk: the raw bit metric puts +0 and -0 a sign bit
    // apart, not zero.
    harness.check_count(
        "ulp(+0, -0) == 2^31 (raw-bit quirk)",
        u64::from(ulp_distance(0.0, -0.0)),
        1 << 31,
    );
    println!();
}

fn check_relative_error(harness: &mut ValidationHarness) {
    println!("═══ Phase 3: Relative error tracking ═════════════════════════");

    harness.check_abs("rel_err(2, 1) = 0.5", relative_error(2.0, 1.0), 0.5, 1e-12);
    harness.check_bool(
        "rel_err(0, tiny) = +inf",
        relative_error(0.0, 1.0e-30).is_infinite(),
    );
    harness.check_bool("rel_err(0, 0) = NaN", relative_error(0.0, 0.0).is_nan());

    // Zero reference in a larger batch: the +∞ must outrank finite errors.
    let mut stats = ErrorStats::new();
    stats.observe(2.0, 1.0, 0);
    stats.observe(0.0, 1.0e-30, 1);
    stats.observe(4.0, 1.0, 2);
    harness.check_bool(
        "+inf wins over finite errors",
        stats.max_rel_err() == Some(f64::INFINITY),
    );
    harness.check_count(
        "argmax points at the zero-reference pair",
        stats.argmax_rel().map_or(u64::MAX, |i| i as u64),
        1,
    );

    // All-NaN stream: no finite max, not a silent NaN winner.
    let mut nan_stats = ErrorStats::new();
    nan_stats.observe(1.0, f32::NAN, 0);
    harness.check_bool(
        "NaN-only stream reports no finite max",
        nan_stats.max_rel_err().is_none(),
    );
    println!();
}

fn check_histogram(harness: &mut ValidationHarness) {
    println!("═══ Phase 4: ULP histogram ═══════════════════════════════════");

    let mut stats = ErrorStats::new();
    let base = 1.0_f32;
    // Distances 0, 2, 15, 16: the last must be dropped from the histogram
    // but still counted in the extrema and the sum.
    let offsets: [u32; 4] = [0, 2, 15, 16];
    for (i, &off) in offsets.iter().enumerate() {
        stats.observe(1.0, f32::from_bits(base.to_bits() + off), i);
    }
    harness.check_count("bucket 0", stats.histogram().bucket(0), 1);
    harness.check_count("bucket 2", stats.histogram().bucket(2), 1);
    harness.check_count("bucket 15", stats.histogram().bucket(15), 1);
    harness.check_count(
        "histogram counted 3 of 4 (distance 16 dropped)",
        stats.histogram().counted(),
        3,
    );
    harness.check_bool(
        "histogram total ≤ observations",
        stats.histogram().counted() <= stats.n(),
    );
    harness.check_count(
        "dropped distance still reaches max",
        stats.max_ulp().unwrap_or(0),
        u64::from(ULP_HISTOGRAM_BUCKETS as u32),
    );
    harness.check_count("dropped distance still reaches sum", stats.ulp_sum(), 33);
    println!();
}

fn check_overflow(harness: &mut ValidationHarness) {
    println!("═══ Phase 5: Mean-sum overflow ═══════════════════════════════");

    // Every pair at the maximum representable distance. Doubling partial
    // aggregates via merge stands in for the ~2^32 such pairs a direct pass
    // would need before the u64 sum wraps; the overflow condition must be
    // re-checked at each merge.
    let lo = f32::from_bits(0x0000_0000);
    let hi = f32::from_bits(0xffff_ffff);
    let mut stats = ErrorStats::new();
    stats.observe(f64::from(lo), hi, 0);
    harness.check_count(
        "max-distance pair scores u32::MAX",
        stats.max_ulp().unwrap_or(0),
        u64::from(u32::MAX),
    );

    let mut doublings = 0u32;
    while !stats.sum_wrapped() && doublings < 64 {
        let partial = stats.clone();
        stats.merge(&partial);
        doublings += 1;
    }
    harness.check_bool("wrap flag set after enough elements", stats.sum_wrapped());
    harness.check_count("doublings to overflow u64", u64::from(doublings), 33);

    // Sticky: further observations never clear it.
    stats.observe(1.0, 1.0, 1);
    harness.check_bool("wrap flag is sticky", stats.sum_wrapped());
    println!("  sum wrapped after {doublings} doublings");
    println!();
}

fn check_ones_gemm(harness: &mut ValidationHarness) {
    println!("═══ Phase 6: All-ones GEMM exactness ═════════════════════════");

    let dim = 64;
    let a = cpu_reference::fill_ones(dim * dim);
    let host = cpu_reference::matmul_f64(&a, &a, dim);
    // Candidate = host result cast to f32; exact for integer results ≤ 2^24.
    #[allow(clippy::cast_possible_truncation)]
    let candidate: Vec<f32> = host.iter().map(|&v| v as f32).collect();
    let report = verify(&host, &candidate, dim);

    harness.check_count("ones: all elements normal", report.classifier.normals(), 4096);
    harness.check_count("ones: max ULP", report.stats.max_ulp().unwrap_or(u64::MAX), 0);
    harness.check_count("ones: min ULP", report.stats.min_ulp().unwrap_or(u64::MAX), 0);
    harness.check_abs(
        "ones: max relative error",
        report.stats.max_rel_err().unwrap_or(f64::NAN),
        0.0,
        1e-300,
    );
    harness.check_count(
        "ones: histogram bucket 0 holds everything",
        report.stats.histogram().bucket(0),
        4096,
    );
    harness.check_bool("ones: no wrap", !report.stats.sum_wrapped());
    println!();
}

fn check_throughput_math(harness: &mut ValidationHarness) {
    println!("═══ Phase 7: Throughput arithmetic ═══════════════════════════");

    // dim multiplications + (dim − 1) additions per element.
    harness.check_count("ops(4) = 112", bench::gemm_ops(4), 112);
    harness.check_count("ops(1) = 1", bench::gemm_ops(1), 1);
    harness.check_abs("112 ops in 112 ns = 1 GFLOPS", bench::gflops(4, 112e-9), 1.0, 1e-9);
    harness.check_bool(
        "workgroup grid covers partial tiles",
        gpu::workgroup_grid(65, gpu::TILE) == (5, 5),
    );
    println!();
}
