// SPDX-License-Identifier: AGPL-3.0-only

//! Tiled f32 matrix-multiplication kernel.
//!
//! Classic shared-memory tiling: each 16×16 workgroup stages a tile of A
//! and a tile of B in workgroup memory, accumulates the partial dot product
//! across tiles, and writes one output element per invocation. Edge tiles
//! are zero-padded so any `dim` works, not only multiples of the tile size.

use std::time::Instant;

use super::{dispatch::workgroup_grid, GpuContext};
use crate::error::CannonadeError;

/// Workgroup tile edge. Must match `TILE` in the shader source.
pub const TILE: u32 = 16;

const GEMM_SHADER: &str = r"
struct Params {
    dim: u32,
}

@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;
@group(0) @binding(2) var<storage, read_write> c: array<f32>;
@group(0) @binding(3) var<uniform> params: Params;

const TILE: u32 = 16u;

var<workgroup> tile_a: array<f32, 256>;
var<workgroup> tile_b: array<f32, 256>;

@compute @workgroup_size(16, 16)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(local_invocation_id) lid: vec3<u32>,
) {
    let dim = params.dim;
    let row = gid.y;
    let col = gid.x;

    var acc = 0.0;
    let n_tiles = (dim + TILE - 1u) / TILE;
    for (var t = 0u; t < n_tiles; t = t + 1u) {
        let a_col = t * TILE + lid.x;
        let b_row = t * TILE + lid.y;
        if (row < dim && a_col < dim) {
            tile_a[lid.y * TILE + lid.x] = a[row * dim + a_col];
        } else {
            tile_a[lid.y * TILE + lid.x] = 0.0;
        }
        if (b_row < dim && col < dim) {
            tile_b[lid.y * TILE + lid.x] = b[b_row * dim + col];
        } else {
            tile_b[lid.y * TILE + lid.x] = 0.0;
        }
        workgroupBarrier();
        for (var k = 0u; k < TILE; k = k + 1u) {
            acc = acc + tile_a[lid.y * TILE + k] * tile_b[k * TILE + lid.x];
        }
        workgroupBarrier();
    }

    if (row < dim && col < dim) {
        c[row * dim + col] = acc;
    }
}
";

/// Result of one kernel execution.
#[derive(Debug, Clone)]
pub struct GemmRun {
    /// Row-major `dim × dim` product, read back from the device.
    pub result: Vec<f32>,
    /// Kernel wall time, submit → device idle. Excludes upload/readback.
    pub kernel_s: f64,
}

/// Compiled GEMM pipeline for a fixed matrix dimension.
#[must_use]
pub struct GemmGpu {
    pipeline: wgpu::ComputePipeline,
    dim: usize,
}

impl GemmGpu {
    /// Compile the kernel for `dim × dim` matrices.
    ///
    /// # Errors
    ///
    /// Returns [`CannonadeError::Config`] if `dim` is zero or the output
    /// would exceed the u32 index space the shader works in.
    pub fn new(gpu: &GpuContext, dim: usize) -> Result<Self, CannonadeError> {
        if dim == 0 {
            return Err(CannonadeError::Config("matrix dim must be positive".into()));
        }
        if u32::try_from(dim * dim).is_err() {
            return Err(CannonadeError::Config(format!(
                "dim {dim} overflows the kernel's u32 index space"
            )));
        }
        Ok(Self {
            pipeline: gpu.create_pipeline(GEMM_SHADER, "gemm"),
            dim,
        })
    }

    /// Matrix dimension this pipeline was compiled for.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Upload `a` and `b`, run the kernel once, read back the product.
    ///
    /// # Errors
    ///
    /// Returns [`CannonadeError::Config`] on input length mismatch, or
    /// [`CannonadeError::GpuCompute`] if the readback fails.
    pub fn run(&self, gpu: &GpuContext, a: &[f32], b: &[f32]) -> Result<GemmRun, CannonadeError> {
        let n = self.dim * self.dim;
        if a.len() != n || b.len() != n {
            return Err(CannonadeError::Config(format!(
                "input matrices must be {n} elements, got {} and {}",
                a.len(),
                b.len()
            )));
        }

        let buffer_a = gpu.create_f32_buffer(a, "gemm_a");
        let buffer_b = gpu.create_f32_buffer(b, "gemm_b");
        let buffer_c = gpu.create_f32_output_buffer(n, "gemm_c");
        #[allow(clippy::cast_possible_truncation)] // validated in new()
        let params = [self.dim as u32, 0, 0, 0];
        let buffer_params = gpu.create_uniform_buffer(bytemuck::cast_slice(&params), "gemm_params");

        let bind_group = gpu.create_bind_group(
            &self.pipeline,
            &[&buffer_a, &buffer_b, &buffer_c, &buffer_params],
        );

        let t0 = Instant::now();
        gpu.dispatch_blocking(&self.pipeline, &bind_group, workgroup_grid(self.dim, TILE));
        let kernel_s = t0.elapsed().as_secs_f64();

        let result = gpu.read_back_f32(&buffer_c, n)?;
        Ok(GemmRun { result, kernel_s })
    }
}
