// SPDX-License-Identifier: AGPL-3.0-only

//! GEMM offload benchmark: GPU f32 matmul vs host f64 reference.
//!
//! Multiplies two seeded `dim × dim` matrices on the GPU, recomputes the
//! product on the host in double precision, then reports the float class
//! census of the GPU output, ULP / relative-error statistics with
//! worst-element positions, and kernel throughput in GFLOPS.
//!
//! Usage:
//!   `gemm_bench <dim> [--ones] [--hist] [--json <dir>]`
//!
//! `--ones` fills both matrices with 1.0 (every product element is exactly
//! `dim` — a kernel smoke test where any nonzero ULP distance is a bug).
//! Select the GPU with `CANNONADE_GPU_ADAPTER` (index or name substring).

use std::time::Instant;

use cannonade::bench::{format_duration, gemm_ops, gflops, now_iso8601, RunRecord};
use cannonade::cpu_reference::{self, DEFAULT_FILL_SEED};
use cannonade::gpu::{GemmGpu, GpuContext};
use cannonade::verify;

struct Args {
    dim: usize,
    ones: bool,
    hist: bool,
    json_dir: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut dim: Option<usize> = None;
    let mut ones = false;
    let mut hist = false;
    let mut json_dir = None;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--ones" => ones = true,
            "--hist" => hist = true,
            "--json" => {
                json_dir = Some(argv.next().ok_or("--json requires a directory")?);
            }
            other => {
                if dim.is_some() {
                    return Err(format!("unexpected argument '{other}'"));
                }
                dim = Some(
                    other
                        .parse()
                        .map_err(|_| format!("invalid matrix size '{other}'"))?,
                );
            }
        }
    }

    let dim = dim.ok_or("missing matrix size")?;
    if dim == 0 {
        return Err("matrix size must be positive".into());
    }
    Ok(Args {
        dim,
        ones,
        hist,
        json_dir,
    })
}

fn usage(program: &str) {
    println!("Wrong number of parameters!");
    println!("Usage: {program} <dim> [--ones] [--hist] [--json <dir>]");
    println!("  <dim>    size of the square matrices");
    println!("  --ones   fill matrices with ones (result = dim, exact)");
    println!("  --hist   print the ULP histogram");
    println!("  --json   write a machine-readable run record to <dir>");
}

#[allow(clippy::too_many_lines)]
fn main() {
    let program = std::env::args().next().unwrap_or_else(|| "gemm_bench".into());
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            println!("Error: {e}");
            usage(&program);
            std::process::exit(1);
        }
    };
    let dim = args.dim;
    let length = dim * dim;

    println!("═══════════════════════════════════════════════════════════");
    println!("  GEMM Offload Benchmark");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("  Matrix multiplication sizes");
    println!("    dim = {dim}");
    println!("    size of matrices = ({dim}, {dim})");
    println!();

    // ── Input fill + host reference ──────────────────────────────────
    let (source_a, source_b, fill_label) = if args.ones {
        eprintln!("  Matrices are filled with ones, expected result = {dim}");
        (
            cpu_reference::fill_ones(length),
            cpu_reference::fill_ones(length),
            "ones".to_string(),
        )
    } else {
        let (a, b) = cpu_reference::fill_uniform_pair(DEFAULT_FILL_SEED, length);
        (a, b, format!("uniform(seed {DEFAULT_FILL_SEED})"))
    };

    eprint!("  Computing reference on host (can take a while for large dim) ... ");
    let t0 = Instant::now();
    let host_result = cpu_reference::matmul_f64(&source_a, &source_b, dim);
    let host_s = t0.elapsed().as_secs_f64();
    eprintln!("done ({})", format_duration(host_s));
    println!();

    // ── GPU offload ──────────────────────────────────────────────────
    println!("  Selecting GPU adapter");
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let gpu = match rt.block_on(GpuContext::new()) {
        Ok(gpu) => gpu,
        Err(e) => {
            println!("  GPU init failed: {e}");
            GpuContext::print_available_adapters();
            std::process::exit(1);
        }
    };
    gpu.print_info();
    println!();

    println!("  Kernel execution start");
    let gemm = match GemmGpu::new(&gpu, dim) {
        Ok(g) => g,
        Err(e) => {
            println!("  Kernel creation failed: {e}");
            std::process::exit(1);
        }
    };
    let run = match gemm.run(&gpu, &source_a, &source_b) {
        Ok(r) => r,
        Err(e) => {
            println!("  Kernel execution failed: {e}");
            std::process::exit(1);
        }
    };
    println!("  Kernel execution finish");

    // ── Result check ─────────────────────────────────────────────────
    let report = verify::verify(&host_result, &run.result, dim);
    report.print(args.hist);

    // ── Kernel performance ───────────────────────────────────────────
    let throughput = gflops(dim, run.kernel_s);
    println!();
    println!("Kernel performance");
    println!("  Floating-point ops: {}", gemm_ops(dim));
    println!(
        "  Kernel execution time: {:.0} ns ({})",
        run.kernel_s * 1e9,
        format_duration(run.kernel_s)
    );
    println!("  Kernel floating-point performance: {throughput:.3} GFLOPS");

    if let Some(dir) = args.json_dir {
        let record = RunRecord {
            timestamp: now_iso8601(),
            adapter: gpu.adapter_name.clone(),
            dim,
            fill: fill_label,
            host_s,
            kernel_s: run.kernel_s,
            gflops: throughput,
            n_elements: report.stats.n(),
            min_ulp: report.stats.min_ulp().unwrap_or(0),
            max_ulp: report.stats.max_ulp().unwrap_or(0),
            mean_ulp: report.stats.mean_ulp().unwrap_or(0.0),
            ulp_sum_wrapped: report.stats.sum_wrapped(),
            max_rel_err: report.stats.max_rel_err(),
            nans: report.classifier.nans(),
            infs: report.classifier.infs(),
        };
        match record.save_json(&dir) {
            Ok(path) => println!("\n  Run record written to {path}"),
            Err(e) => println!("\n  Could not write run record: {e}"),
        }
    }
}
