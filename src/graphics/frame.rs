//! Per-frame upload and render orchestration
//!
//! One call to [`StreamGraphics::render_frame`] performs the whole frame
//! body: acquire the surface image, acquire a mapped staging buffer, write
//! the payload, record the buffer-to-texture copy followed by the render
//! pass, submit, and hand the buffer back to the pool for asynchronous
//! remapping. The remap resolves after submission, so the CPU never blocks
//! on a previous frame's GPU completion — the cost is a few staging buffers
//! in flight instead of a stalled pipeline.

use anyhow::{Context, Result};

use super::{
    BYTES_PER_PIXEL, CLEAR_COLOR, INSTANCE_COUNT, StreamGraphics, TEXTURE_HEIGHT, TEXTURE_WIDTH,
};

impl StreamGraphics {
    /// Run one frame: upload `payload` into the streamed texture and draw.
    ///
    /// `payload` must be exactly [`FRAME_BYTES`](super::FRAME_BYTES) long,
    /// row-major, matching the texture byte layout. Errors are fatal to
    /// frame scheduling; the caller must stop requesting redraws.
    pub fn render_frame(&mut self, payload: &[u8]) -> Result<()> {
        // 1. Acquire the display target for this frame
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Swapchain went stale (resize, display change); reconfigure
                // and skip this frame rather than treating it as fatal.
                tracing::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface texture"),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // 2. Acquire a mapped staging buffer, 3-4. write payload and unmap
        let staging = self.pool.acquire(&self.device)?;
        if let Err(e) = self.pool.write_payload(&staging, payload) {
            // Never submitted, so no remap will return it; release its cap
            // slot instead of letting a dead buffer count as live forever.
            self.pool.discard(staging);
            return Err(e.into());
        }

        // 5. Record: full-extent copy first, then the render pass that
        // samples the freshly copied texture.
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(TEXTURE_WIDTH * BYTES_PER_PIXEL),
                    rows_per_image: Some(TEXTURE_HEIGHT),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: TEXTURE_WIDTH,
                height: TEXTURE_HEIGHT,
                depth_or_array_layers: 1,
            },
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stream Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..3, 0..INSTANCE_COUNT);
        }

        // 6. Submit (fire-and-forget; the queue serializes across frames)
        self.queue.submit(std::iter::once(encoder.finish()));

        // 7. Request the asynchronous remap; the pool re-admits the buffer
        // when the remap resolves.
        self.pool.recycle(staging);

        surface_texture.present();

        self.frame_index += 1;
        if self.log_interval > 0 && self.frame_index % self.log_interval == 0 {
            tracing::debug!(
                frame = self.frame_index,
                allocated = self.pool.allocated(),
                idle = self.pool.idle(),
                in_flight = self.pool.in_flight(),
                "staging pool state"
            );
        }

        Ok(())
    }
}
