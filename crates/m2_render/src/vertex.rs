#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// Two triangles over the four corners produced by [`SpriteVertex::quad`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl SpriteVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Axis-aligned quad with its top-left corner at (`x`, `y`) in screen
    /// space (y down). Corners run top-left, top-right, bottom-right,
    /// bottom-left.
    pub fn quad(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> [SpriteVertex; 4] {
        let right = x + width;
        let bottom = y + height;
        [
            SpriteVertex {
                position: [x, y],
                tex_coords: [0.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [right, y],
                tex_coords: [1.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [right, bottom],
                tex_coords: [1.0, 1.0],
                color,
            },
            SpriteVertex {
                position: [x, bottom],
                tex_coords: [0.0, 1.0],
                color,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_corners_span_the_requested_rect() {
        let q = SpriteVertex::quad(10.0, 20.0, 80.0, 40.0, [1.0; 4]);
        assert_eq!(q[0].position, [10.0, 20.0]);
        assert_eq!(q[2].position, [90.0, 60.0]);
        assert_eq!(q[0].tex_coords, [0.0, 0.0]);
        assert_eq!(q[2].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn vertex_layout_stride_matches_struct() {
        assert_eq!(SpriteVertex::layout().array_stride, 32);
    }
}
