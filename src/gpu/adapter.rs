// SPDX-License-Identifier: AGPL-3.0-only

//! GPU adapter discovery and selection.
//!
//! Runtime capability probing — no hardcoded GPU assumptions. The adapter
//! is selected by environment variable or auto-detected (discrete GPUs
//! first).

/// Summary of a discovered GPU adapter.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    /// Enumeration index (stable within a single run).
    pub index: usize,
    /// Adapter name as reported by the driver.
    pub name: String,
    /// Driver name (e.g. `"NVIDIA"`, `"radv"`, `"Intel"`).
    pub driver: String,
    /// Whether `TIMESTAMP_QUERY` is supported.
    pub has_timestamps: bool,
    /// Adapter device type (discrete, integrated, software, etc.).
    pub device_type: wgpu::DeviceType,
}

impl std::fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.device_type {
            wgpu::DeviceType::DiscreteGpu => "discrete",
            wgpu::DeviceType::IntegratedGpu => "integrated",
            wgpu::DeviceType::VirtualGpu => "virtual",
            wgpu::DeviceType::Cpu => "cpu",
            wgpu::DeviceType::Other => "other",
        };
        let ts = if self.has_timestamps { "ts" } else { "no-ts" };
        write!(
            f,
            "[{}] {} ({}, {}, {})",
            self.index, self.name, self.driver, kind, ts
        )
    }
}

/// Create a wgpu instance with the backend configured via
/// `CANNONADE_WGPU_BACKEND` (`vulkan`, `metal`, `dx12`; default all).
pub fn create_instance() -> wgpu::Instance {
    let backends = match std::env::var("CANNONADE_WGPU_BACKEND").as_deref() {
        Ok("vulkan") => wgpu::Backends::VULKAN,
        Ok("metal") => wgpu::Backends::METAL,
        Ok("dx12") => wgpu::Backends::DX12,
        _ => wgpu::Backends::all(),
    };
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    })
}

/// Enumerate all available GPU adapters.
///
/// Use the `index` field with `CANNONADE_GPU_ADAPTER=<index>` to target a
/// specific GPU.
#[must_use]
pub fn enumerate_adapters() -> Vec<AdapterInfo> {
    let instance = create_instance();
    instance
        .enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .enumerate()
        .map(|(i, adapter)| {
            let info = adapter.get_info();
            let features = adapter.features();
            AdapterInfo {
                index: i,
                name: info.name.clone(),
                driver: info.driver.clone(),
                has_timestamps: features.contains(wgpu::Features::TIMESTAMP_QUERY),
                device_type: info.device_type,
            }
        })
        .collect()
}

/// Select an adapter based on `CANNONADE_GPU_ADAPTER`: an enumeration
/// index, a case-insensitive name substring, or `auto`/unset for
/// auto-detection (first discrete GPU, then anything).
///
/// # Errors
///
/// Returns [`crate::error::CannonadeError`] if no compatible adapter is
/// found.
pub fn select_adapter() -> Result<wgpu::Adapter, crate::error::CannonadeError> {
    let selector = std::env::var("CANNONADE_GPU_ADAPTER")
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let instance = create_instance();
    let adapters: Vec<wgpu::Adapter> = instance.enumerate_adapters(wgpu::Backends::all());
    if adapters.is_empty() {
        return Err(crate::error::CannonadeError::NoAdapter);
    }

    if selector.is_empty() || selector == "auto" {
        auto_select(adapters)
    } else if let Ok(idx) = selector.parse::<usize>() {
        select_by_index(adapters, idx)
    } else {
        select_by_name(adapters, &selector)
    }
}

fn auto_select(
    adapters: Vec<wgpu::Adapter>,
) -> Result<wgpu::Adapter, crate::error::CannonadeError> {
    let mut fallback: Option<wgpu::Adapter> = None;
    for a in adapters {
        if a.get_info().device_type == wgpu::DeviceType::DiscreteGpu {
            return Ok(a);
        }
        if fallback.is_none() {
            fallback = Some(a);
        }
    }
    fallback.ok_or(crate::error::CannonadeError::NoAdapter)
}

fn select_by_index(
    adapters: Vec<wgpu::Adapter>,
    idx: usize,
) -> Result<wgpu::Adapter, crate::error::CannonadeError> {
    let count = adapters.len();
    adapters.into_iter().nth(idx).ok_or_else(|| {
        crate::error::CannonadeError::DeviceCreation(format!(
            "Adapter index {idx} out of range ({count} adapters)"
        ))
    })
}

fn select_by_name(
    adapters: Vec<wgpu::Adapter>,
    selector: &str,
) -> Result<wgpu::Adapter, crate::error::CannonadeError> {
    adapters
        .into_iter()
        .find(|a| a.get_info().name.to_ascii_lowercase().contains(selector))
        .ok_or_else(|| {
            crate::error::CannonadeError::DeviceCreation(format!(
                "No adapter matching '{selector}'"
            ))
        })
}
