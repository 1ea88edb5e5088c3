//! Vertex layout and static mesh data for the streamed-texture triangle.

use bytemuck::{Pod, Zeroable};

/// One vertex of the demo triangle: clip-space position + texture UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StreamVertex {
    /// Clip-space position before the per-instance offset is added.
    pub position: [f32; 2],
    /// Texture coordinate sampling the streamed texture.
    pub uv: [f32; 2],
}

impl StreamVertex {
    /// Stride in bytes (two Float32x2 attributes, tightly packed).
    pub const STRIDE: u64 = std::mem::size_of::<Self>() as u64;

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        // Location 0: position
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        },
        // Location 1: uv
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 8,
            shader_location: 1,
        },
    ];

    /// Vertex buffer layout for pipeline creation.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// The one static triangle, UV-mapped across the full texture.
pub const TRIANGLE: [StreamVertex; 3] = [
    StreamVertex {
        position: [0.0, 0.3],
        uv: [0.5, 0.0],
    },
    StreamVertex {
        position: [-0.3, -0.3],
        uv: [0.0, 1.0],
    },
    StreamVertex {
        position: [0.3, -0.3],
        uv: [1.0, 1.0],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_attributes() {
        // position (8 bytes) + uv (8 bytes), no padding
        assert_eq!(StreamVertex::STRIDE, 16);
        let layout = StreamVertex::layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 8);
    }

    #[test]
    fn triangle_uvs_stay_in_range() {
        for v in TRIANGLE {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn triangle_bytes_are_pod_castable() {
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE);
        assert_eq!(bytes.len(), 3 * StreamVertex::STRIDE as usize);
    }
}
