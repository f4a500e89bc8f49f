// SPDX-License-Identifier: AGPL-3.0-only

//! Host-side reference computation and input generation.
//!
//! The reference GEMM accumulates in f64 from f32 inputs so the comparison
//! against the accelerator's f32 result measures the accelerator's rounding,
//! not the host's. Row-parallel via rayon; within a row the i-k-j loop order
//! keeps the inner loop streaming over contiguous memory.

use rayon::prelude::*;

/// Default seed for the uniform fill. Fixed so every run multiplies the
/// same matrices and ULP reports stay comparable across hardware.
pub const DEFAULT_FILL_SEED: u64 = 9;

/// Minimal deterministic LCG (Knuth MMIX constants).
///
/// Input generation needs reproducibility, not statistical quality; a
/// one-line generator keeps the fill portable and dependency-free.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    /// Seed the generator.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1),
        }
    }

    /// Next raw 64-bit state.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    /// Uniform sample in `[0, 1)` from the top 53 bits.
    #[allow(clippy::cast_precision_loss)] // 53-bit mantissa fits exactly
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Fill a buffer with seeded uniform `[0, 1)` values, narrowed to f32.
#[must_use]
pub fn fill_uniform(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = LcgRng::new(seed);
    #[allow(clippy::cast_possible_truncation)] // [0,1) narrows without surprises
    (0..len).map(|_| rng.uniform() as f32).collect()
}

/// Fill both input matrices from a single seeded stream, `a[i]` and `b[i]`
/// drawn alternately — one fill loop, like the benchmark has always done.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // [0,1) narrows without surprises
pub fn fill_uniform_pair(seed: u64, len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut rng = LcgRng::new(seed);
    let mut a = Vec::with_capacity(len);
    let mut b = Vec::with_capacity(len);
    for _ in 0..len {
        a.push(rng.uniform() as f32);
        b.push(rng.uniform() as f32);
    }
    (a, b)
}

/// Fill a buffer with ones (debug mode: every product element equals `dim`).
#[must_use]
pub fn fill_ones(len: usize) -> Vec<f32> {
    vec![1.0; len]
}

/// Reference product `C = A·B` for square row-major `dim × dim` matrices,
/// f32 inputs accumulated in f64.
///
/// # Panics
///
/// Panics if either input length is not `dim * dim`.
#[must_use]
pub fn matmul_f64(a: &[f32], b: &[f32], dim: usize) -> Vec<f64> {
    assert_eq!(a.len(), dim * dim, "matrix A must be dim*dim");
    assert_eq!(b.len(), dim * dim, "matrix B must be dim*dim");

    let mut c = vec![0.0_f64; dim * dim];
    c.par_chunks_mut(dim).enumerate().for_each(|(i, row)| {
        for k in 0..dim {
            let aik = f64::from(a[i * dim + k]);
            let b_row = &b[k * dim..(k + 1) * dim];
            for (cj, &bkj) in row.iter_mut().zip(b_row) {
                *cj += aik * f64::from(bkj);
            }
        }
    });
    c
}
