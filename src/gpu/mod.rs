// SPDX-License-Identifier: AGPL-3.0-only

//! GPU compute layer for the f32 GEMM offload.
//!
//! Creates a wgpu device on any available backend and provides helpers for
//! f32 storage buffers, staging readback, and single-dispatch execution.
//!
//! ## Adapter selection
//!
//! Set `CANNONADE_GPU_ADAPTER` to target a specific GPU:
//!
//! | Value | Behavior |
//! |-------|----------|
//! | `auto` / *(unset)* | first discrete GPU, else first adapter |
//! | `0`, `1`, … | select adapter by enumeration index |
//! | substring | case-insensitive name match (e.g. `"4070"`) |
//!
//! ## Module structure
//!
//! - `adapter` — adapter discovery and selection
//! - `buffers` — f32 buffer creation, upload, readback
//! - `dispatch` — bind groups and blocking dispatch
//! - `gemm` — tiled matrix-multiplication kernel

mod adapter;
mod buffers;
mod dispatch;
mod gemm;

pub use adapter::AdapterInfo;
pub use buffers::mapped_bytes_to_f32;
pub use dispatch::workgroup_grid;
pub use gemm::{GemmGpu, GemmRun, TILE};

/// GPU context for the benchmark kernel.
#[must_use]
pub struct GpuContext {
    /// Adapter name as reported by the driver.
    pub adapter_name: String,
    /// Whether the device supports `TIMESTAMP_QUERY` (informational; kernel
    /// timing is host wall-clock around submit → wait).
    pub has_timestamps: bool,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Access the underlying wgpu Device.
    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Access the underlying wgpu Queue.
    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Create the GPU device.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CannonadeError`] if no adapter is found or
    /// device creation fails.
    pub async fn new() -> Result<Self, crate::error::CannonadeError> {
        let selected = adapter::select_adapter()?;
        let adapter_info = selected.get_info();
        let adapter_features = selected.features();

        let mut required_features = wgpu::Features::empty();
        if adapter_features.contains(wgpu::Features::TIMESTAMP_QUERY) {
            required_features |= wgpu::Features::TIMESTAMP_QUERY;
        }

        // Large dim needs room: 4096² f32 matrices are 64 MiB each.
        let required_limits = wgpu::Limits {
            max_storage_buffer_binding_size: 512 * 1024 * 1024,
            max_buffer_size: 1024 * 1024 * 1024,
            ..wgpu::Limits::default()
        };

        let (device, queue) = selected
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("cannonade device"),
                    required_features,
                    required_limits,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| crate::error::CannonadeError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            adapter_name: adapter_info.name,
            has_timestamps: required_features.contains(wgpu::Features::TIMESTAMP_QUERY),
            device,
            queue,
        })
    }

    /// Enumerate all available GPU adapters.
    #[must_use]
    pub fn enumerate_adapters() -> Vec<AdapterInfo> {
        adapter::enumerate_adapters()
    }

    /// Print device capabilities.
    pub fn print_info(&self) {
        println!("  GPU: {}", self.adapter_name);
        println!(
            "  TIMESTAMP_QUERY: {}",
            if self.has_timestamps { "YES" } else { "NO" }
        );
    }

    /// Print all available adapters to stdout.
    pub fn print_available_adapters() {
        let adapters = Self::enumerate_adapters();
        println!("  Available GPU adapters:");
        for info in &adapters {
            println!("    {info}");
        }
        if adapters.is_empty() {
            println!("    (none found)");
        }
    }

    /// Create a compute pipeline from WGSL source. Entry point is `main`.
    #[must_use]
    pub fn create_pipeline(&self, shader_source: &str, label: &str) -> wgpu::ComputePipeline {
        let shader_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(shader_source.into()),
            });

        self.device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &shader_module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
    }
}
