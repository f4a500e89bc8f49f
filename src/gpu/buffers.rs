// SPDX-License-Identifier: AGPL-3.0-only

//! GPU buffer creation, upload, and readback for f32 matrix data.

use super::GpuContext;

impl GpuContext {
    /// Create a storage buffer from f32 data (read-only input).
    #[must_use]
    pub fn create_f32_buffer(&self, data: &[f32], label: &str) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        self.device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            })
    }

    /// Create a writable storage buffer for f32 output.
    #[must_use]
    pub fn create_f32_output_buffer(&self, count: usize, label: &str) -> wgpu::Buffer {
        self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (count * 4) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a staging buffer for reading results back to the CPU.
    #[must_use]
    pub fn create_staging_buffer(&self, size: usize, label: &str) -> wgpu::Buffer {
        self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a uniform buffer from raw bytes.
    #[must_use]
    pub fn create_uniform_buffer(&self, data: &[u8], label: &str) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        self.device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    /// Read back f32 data from a GPU buffer via a staging copy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CannonadeError::GpuCompute`] if the map
    /// callback fails or the channel is dropped.
    pub fn read_back_f32(
        &self,
        buffer: &wgpu::Buffer,
        count: usize,
    ) -> Result<Vec<f32>, crate::error::CannonadeError> {
        let staging = self.create_staging_buffer(count * 4, "readback");
        let mut encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, (count * 4) as u64);
        self.queue().submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device().poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| {
                crate::error::CannonadeError::GpuCompute(
                    "readback map callback: channel recv failed".into(),
                )
            })?
            .map_err(|e| {
                crate::error::CannonadeError::GpuCompute(format!("staging buffer mapping: {e}"))
            })?;

        let data = slice.get_mapped_range();
        let result = mapped_bytes_to_f32(&data);
        drop(data);
        staging.unmap();
        Ok(result)
    }
}

/// Convert mapped GPU buffer bytes to f32 values.
///
/// Mapped ranges are typically page-aligned so the direct cast succeeds;
/// falls back to per-chunk conversion if the alignment is off.
#[must_use]
pub fn mapped_bytes_to_f32(data: &[u8]) -> Vec<f32> {
    bytemuck::try_cast_slice(data).map_or_else(
        |_| {
            data.chunks_exact(4)
                .map(|chunk| {
                    let mut b = [0u8; 4];
                    b.copy_from_slice(chunk);
                    f32::from_le_bytes(b)
                })
                .collect()
        },
        <[f32]>::to_vec,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)] // byte-exact round trip
    fn mapped_bytes_round_trip() {
        let original = [0.0_f32, 1.0, -1.0, f32::INFINITY, f32::MIN_POSITIVE];
        let bytes: Vec<u8> = original.iter().flat_map(|v| v.to_le_bytes()).collect();
        let back = mapped_bytes_to_f32(&bytes);
        assert_eq!(back.len(), original.len());
        for (a, b) in original.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn mapped_bytes_preserves_nan_payload() {
        let nan = f32::from_bits(0x7fc0_1234);
        let bytes = nan.to_le_bytes();
        let back = mapped_bytes_to_f32(&bytes);
        assert_eq!(back[0].to_bits(), 0x7fc0_1234);
    }

    #[test]
    fn mapped_bytes_empty() {
        assert!(mapped_bytes_to_f32(&[]).is_empty());
    }
}
