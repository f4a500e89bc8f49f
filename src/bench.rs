// SPDX-License-Identifier: AGPL-3.0-only

//! Kernel timing, throughput arithmetic, and machine-readable run records.

use serde::{Deserialize, Serialize};

/// Floating-point operations in a square `dim × dim` GEMM:
/// `dim` multiplications and `dim − 1` additions per result element.
#[must_use]
pub fn gemm_ops(dim: usize) -> u64 {
    if dim == 0 {
        return 0;
    }
    let d = dim as u64;
    d * d * (2 * d - 1)
}

/// Kernel throughput in GFLOPS from the dispatch wall time.
#[must_use]
#[allow(clippy::cast_precision_loss)] // op counts far below 2^52 at benchmark scale
pub fn gflops(dim: usize, kernel_s: f64) -> f64 {
    gemm_ops(dim) as f64 / (kernel_s * 1e9)
}

/// One benchmark run, serialized to JSON for cross-run comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: String,
    pub adapter: String,
    pub dim: usize,
    /// `"uniform(seed)"` or `"ones"`.
    pub fill: String,
    pub host_s: f64,
    pub kernel_s: f64,
    pub gflops: f64,
    pub n_elements: u64,
    pub min_ulp: u64,
    pub max_ulp: u64,
    pub mean_ulp: f64,
    pub ulp_sum_wrapped: bool,
    /// `None` when no comparable (non-NaN) relative error was observed.
    pub max_rel_err: Option<f64>,
    pub nans: u64,
    pub infs: u64,
}

impl RunRecord {
    /// Save to `<dir>/gemm_<dim>_<timestamp>.json`. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the directory cannot be created, the file cannot be
    /// written, or serialization fails.
    pub fn save_json(&self, dir: &str) -> std::io::Result<String> {
        std::fs::create_dir_all(dir)?;
        let path = format!(
            "{dir}/gemm_{}_{}.json",
            self.dim,
            self.timestamp.replace(':', "-")
        );
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Pure-Rust ISO 8601 timestamp (UTC, second resolution).
#[must_use]
pub fn now_iso8601() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let day_secs = (secs % 86400) as u32;
    let (hour, minute, second) = (day_secs / 3600, (day_secs % 3600) / 60, day_secs % 60);
    // Civil date from days since 1970-01-01 (Howard Hinnant, public domain)
    let z = (secs / 86400) as i64 + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = i64::from(yoe) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}-{m:02}-{d:02}T{hour:02}:{minute:02}:{second:02}")
}

/// Format a duration for display.
#[must_use]
pub fn format_duration(secs: f64) -> String {
    if secs < 0.001 {
        format!("{:.1} us", secs * 1e6)
    } else if secs < 1.0 {
        format!("{:.1} ms", secs * 1e3)
    } else if secs < 60.0 {
        format!("{secs:.2} s")
    } else {
        format!("{:.1} min", secs / 60.0)
    }
}
