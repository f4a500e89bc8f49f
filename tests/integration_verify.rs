// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: fill → reference GEMM → verification pipeline.
//!
//! Exercises the crate the way the benchmark binary does, with the
//! accelerator result stood in by host data (exact casts and controlled
//! perturbations), so every aggregate has a hand-checkable expectation.

use cannonade::bench;
use cannonade::compare::ErrorStats;
use cannonade::cpu_reference::{self, DEFAULT_FILL_SEED};
use cannonade::tolerances;
use cannonade::verify::verify;

#[allow(clippy::cast_possible_truncation)] // deliberate f64 → f32 narrowing
fn narrow(host: &[f64]) -> Vec<f32> {
    host.iter().map(|&v| v as f32).collect()
}

#[test]
fn ones_pipeline_is_exact_end_to_end() {
    let dim = 32;
    let a = cpu_reference::fill_ones(dim * dim);
    let host = cpu_reference::matmul_f64(&a, &a, dim);
    let candidate = narrow(&host);

    let report = verify(&host, &candidate, dim);
    assert_eq!(report.classifier.total(), (dim * dim) as u64);
    assert_eq!(report.classifier.normals(), (dim * dim) as u64);
    assert_eq!(report.stats.max_ulp(), Some(0), "ones product must be exact");
    assert_eq!(report.stats.max_rel_err(), Some(0.0));
    assert_eq!(report.stats.histogram().bucket(0), (dim * dim) as u64);
    assert!(!report.stats.sum_wrapped());
}

#[test]
fn uniform_pipeline_with_exact_candidate_scores_zero() {
    // The candidate IS the narrowed reference, so both metrics compare a
    // value against itself: zero ULP, zero relative error, everywhere.
    let dim = 24;
    let (a, b) = cpu_reference::fill_uniform_pair(DEFAULT_FILL_SEED, dim * dim);
    let host = cpu_reference::matmul_f64(&a, &b, dim);
    let candidate = narrow(&host);

    let report = verify(&host, &candidate, dim);
    assert_eq!(report.stats.min_ulp(), Some(0));
    assert_eq!(report.stats.max_ulp(), Some(0));
    assert_eq!(report.stats.mean_ulp(), Some(0.0));
    assert_eq!(report.stats.max_rel_err(), Some(0.0));
    assert_eq!(report.stats.argmax_ulp(), Some(0), "all-tie resolves to index 0");
}

#[test]
fn perturbed_elements_are_located_and_binned() {
    let dim = 16;
    let (a, b) = cpu_reference::fill_uniform_pair(DEFAULT_FILL_SEED, dim * dim);
    let host = cpu_reference::matmul_f64(&a, &b, dim);
    let mut candidate = narrow(&host);

    // Nudge three elements by 1, 5, and 5 ULP. The worst must resolve to
    // the FIRST 5-ULP element, in row-major coordinates.
    let bump = |v: f32, n: u32| f32::from_bits(v.to_bits() + n);
    candidate[10] = bump(candidate[10], 1);
    candidate[40] = bump(candidate[40], 5);
    candidate[200] = bump(candidate[200], 5);

    let report = verify(&host, &candidate, dim);
    assert_eq!(report.stats.max_ulp(), Some(5));
    let worst = report.worst_ulp.expect("worst pair");
    assert_eq!(worst.index, 40, "first occurrence of the max wins");
    assert_eq!((worst.row, worst.col), (2, 8));
    assert_eq!(report.stats.histogram().bucket(1), 1);
    assert_eq!(report.stats.histogram().bucket(5), 2);
    assert_eq!(
        report.stats.histogram().bucket(0),
        (dim * dim - 3) as u64,
        "untouched elements stay in bucket 0"
    );
}

#[test]
fn chunked_merge_equals_sequential_over_gemm_stream() {
    let dim = 20;
    let (a, b) = cpu_reference::fill_uniform_pair(DEFAULT_FILL_SEED, dim * dim);
    let host = cpu_reference::matmul_f64(&a, &b, dim);
    let mut candidate = narrow(&host);
    // A few perturbations so the extrema are non-trivial, including a NaN
    // whose relative error must stay excluded on both paths.
    candidate[7] = f32::from_bits(candidate[7].to_bits() + 9);
    candidate[123] = f32::NAN;

    let sequential = {
        let mut s = ErrorStats::new();
        for (i, (&h, &c)) in host.iter().zip(&candidate).enumerate() {
            s.observe(h, c, i);
        }
        s
    };

    for chunk in [1_usize, 7, 64, 150] {
        let mut merged = ErrorStats::new();
        let mut start = 0;
        while start < host.len() {
            let end = (start + chunk).min(host.len());
            let mut partial = ErrorStats::new();
            for i in start..end {
                partial.observe(host[i], candidate[i], i);
            }
            merged.merge(&partial);
            start = end;
        }
        assert_eq!(merged.n(), sequential.n(), "chunk {chunk}");
        assert_eq!(merged.min_ulp(), sequential.min_ulp(), "chunk {chunk}");
        assert_eq!(merged.max_ulp(), sequential.max_ulp(), "chunk {chunk}");
        assert_eq!(merged.argmax_ulp(), sequential.argmax_ulp(), "chunk {chunk}");
        assert_eq!(merged.argmax_rel(), sequential.argmax_rel(), "chunk {chunk}");
        assert_eq!(merged.ulp_sum(), sequential.ulp_sum(), "chunk {chunk}");
        assert_eq!(
            merged.histogram().buckets(),
            sequential.histogram().buckets(),
            "chunk {chunk}"
        );
    }
}

#[test]
fn acceptance_thresholds_hold_for_simulated_f32_accelerator() {
    // Simulate an accelerator by accumulating the product in f32 — the
    // rounding profile a real device produces. The documented thresholds
    // must hold with room to spare at this dim.
    let dim = 96;
    let (a, b) = cpu_reference::fill_uniform_pair(DEFAULT_FILL_SEED, dim * dim);
    let host = cpu_reference::matmul_f64(&a, &b, dim);

    let mut accel = vec![0.0_f32; dim * dim];
    for i in 0..dim {
        for j in 0..dim {
            let mut acc = 0.0_f32;
            for k in 0..dim {
                acc += a[i * dim + k] * b[k * dim + j];
            }
            accel[i * dim + j] = acc;
        }
    }

    let report = verify(&host, &accel, dim);
    let max_ulp = report.stats.max_ulp().expect("observations exist");
    let max_rel = report.stats.max_rel_err().expect("finite errors exist");
    assert!(
        max_ulp <= tolerances::GEMM_MAX_ULP_RANDOM,
        "max ULP {max_ulp} above acceptance"
    );
    assert!(
        max_rel <= tolerances::GEMM_MAX_REL_ERR_RANDOM,
        "max rel err {max_rel} above acceptance"
    );
    assert_eq!(report.classifier.nans(), 0);
    assert_eq!(report.classifier.infs(), 0);
}

#[test]
fn run_record_captures_report_fields() {
    let dim = 8;
    let a = cpu_reference::fill_ones(dim * dim);
    let host = cpu_reference::matmul_f64(&a, &a, dim);
    let candidate = narrow(&host);
    let report = verify(&host, &candidate, dim);

    let record = bench::RunRecord {
        timestamp: bench::now_iso8601(),
        adapter: "integration".into(),
        dim,
        fill: "ones".into(),
        host_s: 0.0,
        kernel_s: 1e-6,
        gflops: bench::gflops(dim, 1e-6),
        n_elements: report.stats.n(),
        min_ulp: report.stats.min_ulp().unwrap_or(0),
        max_ulp: report.stats.max_ulp().unwrap_or(0),
        mean_ulp: report.stats.mean_ulp().unwrap_or(0.0),
        ulp_sum_wrapped: report.stats.sum_wrapped(),
        max_rel_err: report.stats.max_rel_err(),
        nans: report.classifier.nans(),
        infs: report.classifier.infs(),
    };

    let json = serde_json::to_string(&record).expect("serialize");
    let back: bench::RunRecord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.n_elements, 64);
    assert_eq!(back.max_ulp, 0);
    assert_eq!(back.max_rel_err, Some(0.0));
    assert!(!back.ulp_sum_wrapped);
}
