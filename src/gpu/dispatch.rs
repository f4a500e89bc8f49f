// SPDX-License-Identifier: AGPL-3.0-only

//! Bind groups and blocking dispatch.
//!
//! The benchmark issues exactly one compute dispatch and waits for it, so
//! timing brackets the submit → idle interval and nothing else.

use super::GpuContext;

/// Workgroup grid covering a `dim × dim` output with `tile × tile` groups.
#[must_use]
pub fn workgroup_grid(dim: usize, tile: u32) -> (u32, u32) {
    let groups = u32::try_from(dim.div_ceil(tile as usize)).unwrap_or(u32::MAX);
    (groups, groups)
}

impl GpuContext {
    /// Create a bind group from a pipeline and ordered buffer slice.
    ///
    /// Each buffer is bound at binding index 0, 1, 2, ... in order.
    #[must_use]
    pub fn create_bind_group(
        &self,
        pipeline: &wgpu::ComputePipeline,
        buffers: &[&wgpu::Buffer],
    ) -> wgpu::BindGroup {
        let layout = pipeline.get_bind_group_layout(0);
        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(i, buf)| wgpu::BindGroupEntry {
                binding: u32::try_from(i).unwrap_or(0),
                resource: buf.as_entire_binding(),
            })
            .collect();
        self.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bind_group"),
            layout: &layout,
            entries: &entries,
        })
    }

    /// Encode one compute pass, submit it, and block until the device is
    /// idle. Returns only once the kernel has finished.
    pub fn dispatch_blocking(
        &self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: (u32, u32),
    ) {
        let mut encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("dispatch"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }
        self.queue().submit(std::iter::once(encoder.finish()));
        self.device().poll(wgpu::Maintain::Wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_exact_multiples() {
        assert_eq!(workgroup_grid(64, 16), (4, 4));
        assert_eq!(workgroup_grid(16, 16), (1, 1));
    }

    #[test]
    fn grid_rounds_up_partial_tiles() {
        assert_eq!(workgroup_grid(65, 16), (5, 5));
        assert_eq!(workgroup_grid(1, 16), (1, 1));
    }

    #[test]
    fn grid_of_zero_dim_is_empty() {
        assert_eq!(workgroup_grid(0, 16), (0, 0));
    }
}
