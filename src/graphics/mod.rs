//! wgpu graphics backend for texstream
//!
//! # Architecture
//!
//! **FrameSource** (CPU frames) → **StagingBufferPool** (mapped transfer
//! buffers) → **target texture** (GPU) → **render pass** (instanced triangles)
//!
//! - `init` sets up the device, surface, target texture, pipeline, and the
//!   static resources (vertex buffer, offsets uniform, bind group)
//! - `staging` owns the pool of host-mappable transfer buffers
//! - `frame` runs the per-frame upload + render sequence
//!
//! `StreamGraphics` owns all GPU resources; everything is released when it
//! drops (wgpu resources implement `Drop`). Staging buffers still in flight
//! at teardown are released by their remap callbacks.

mod frame;
mod init;
pub mod staging;
pub mod vertex;

use staging::StagingBufferPool;

/// Streamed texture width in pixels.
pub const TEXTURE_WIDTH: u32 = 4096;

/// Streamed texture height in pixels.
pub const TEXTURE_HEIGHT: u32 = 4096;

/// Bytes per pixel for Rgba8Unorm.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Exact byte length of one frame payload (tightly packed rows).
///
/// This is also the capacity of every staging buffer; the row pitch
/// (`TEXTURE_WIDTH * 4` = 16384) already satisfies wgpu's 256-byte
/// `bytes_per_row` alignment, so no row padding is ever needed.
pub const FRAME_BYTES: usize =
    (TEXTURE_WIDTH as usize) * (TEXTURE_HEIGHT as usize) * (BYTES_PER_PIXEL as usize);

/// Number of triangle instances drawn per frame. Each instance reads its
/// own row of the offsets uniform via `instance_index`.
pub const INSTANCE_COUNT: u32 = 3;

/// Fixed background color the display target is cleared to every frame.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// texstream graphics backend
///
/// Manages the wgpu device, the streamed target texture, the staging buffer
/// pool, and the static render resources (pipeline, vertex buffer, bind
/// group with texture + sampler + offsets uniform).
pub struct StreamGraphics {
    // Core wgpu objects
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    // Streamed target texture (fully overwritten every frame)
    target: wgpu::Texture,

    // Staging buffer pool (host -> device transfer intermediaries)
    pool: StagingBufferPool,

    // Static render resources
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,

    // Frame counter for interval logging
    frame_index: u64,
    log_interval: u64,
}

impl StreamGraphics {
    /// Get the wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Get the surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Staging pool telemetry for the debug overlay / logs.
    pub fn pool(&self) -> &StagingBufferPool {
        &self.pool
    }

    /// Reconfigure the surface after a window resize.
    ///
    /// The streamed texture and pipeline are untouched; only the swapchain
    /// is kept valid.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        tracing::debug!("Surface reconfigured to {}x{}", width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_bytes_matches_texture_extent() {
        assert_eq!(FRAME_BYTES, 4096 * 4096 * 4);
    }

    #[test]
    fn row_pitch_is_copy_aligned() {
        // wgpu requires bytes_per_row % 256 == 0 for buffer-to-texture copies
        assert_eq!((TEXTURE_WIDTH * BYTES_PER_PIXEL) % 256, 0);
    }
}
