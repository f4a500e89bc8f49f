// SPDX-License-Identifier: AGPL-3.0-only

//! cannonade — GPU GEMM offload benchmark with numerical verification.
//!
//! Offloads a dense single-precision matrix multiplication to a GPU compute
//! shader, recomputes the product on the host in double precision, then
//! verifies the accelerator output element by element: IEEE-754 class census,
//! bit-level ULP distances, relative errors, and worst-case positions.
//!
//! ## Modules
//!   - `classify` — IEEE-754 f32 class census (zero/subnormal/normal/inf/NaN)
//!   - `ulp` — bit-pattern distance and relative-error primitives
//!   - `compare` — streaming error aggregates, histogram, worst-case tracking
//!   - `cpu_reference` — seeded fills and the f64-accumulation reference GEMM
//!   - `gpu` — wgpu device setup, f32 buffers, tiled matmul kernel
//!   - `verify` — one-pass verification driver and result-check report
//!   - `bench` — kernel timing, GFLOPS, JSON run records
//!   - `validation` — pass/fail check harness for the validation binaries
//!   - `tolerances` — documented acceptance thresholds
//!
//! ## Binaries
//!   - `gemm_bench` — end-to-end offload + verify + throughput report
//!   - `validate_verify_core` — CPU-only checks of the verification core

pub mod bench;
pub mod classify;
pub mod compare;
pub mod cpu_reference;
pub mod error;
pub mod gpu;
pub mod tolerances;
pub mod ulp;
pub mod validation;
pub mod verify;
