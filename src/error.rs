// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for GPU setup and benchmark driver operations.
//!
//! Public APIs return this enum rather than `Result<_, String>` so callers
//! can pattern-match on failure modes (no adapter, device creation, compute)
//! instead of parsing opaque strings.

use std::fmt;

/// Errors arising from GPU initialization, kernel execution, or driver
/// configuration.
#[derive(Debug)]
pub enum CannonadeError {
    /// No compatible GPU adapter was found by wgpu.
    NoAdapter,

    /// GPU device creation failed (wraps the underlying wgpu error message).
    DeviceCreation(String),

    /// Kernel dispatch or buffer readback failed.
    GpuCompute(String),

    /// Invalid benchmark configuration (matrix size, argument parsing).
    Config(String),
}

impl fmt::Display for CannonadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "No GPU adapter found"),
            Self::DeviceCreation(e) => write!(f, "Failed to create GPU device: {e}"),
            Self::GpuCompute(e) => write!(f, "GPU compute failed: {e}"),
            Self::Config(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for CannonadeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_no_adapter() {
        let err = CannonadeError::NoAdapter;
        assert_eq!(err.to_string(), "No GPU adapter found");
    }

    #[test]
    fn display_device_creation() {
        let err = CannonadeError::DeviceCreation("wgpu error".into());
        assert_eq!(err.to_string(), "Failed to create GPU device: wgpu error");
    }

    #[test]
    fn display_config() {
        let err = CannonadeError::Config("dim must be positive".into());
        assert!(err.to_string().contains("dim must be positive"));
    }

    #[test]
    fn error_trait_works() {
        let err = CannonadeError::GpuCompute("staging map failed".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().contains("staging map failed"));
    }
}
