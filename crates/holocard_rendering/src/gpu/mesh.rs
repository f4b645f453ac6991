//! Card geometry.
//!
//! A thin box: artwork on the front face, mirrored artwork on the back so
//! a flipped card reads left to right, plain edges.

use bytemuck::{Pod, Zeroable};
use holocard_shared::{CARD_DEPTH, CARD_HEIGHT, CARD_WIDTH};

/// Card mesh vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CardVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Artwork coordinates
    pub uv: [f32; 2],
}

impl CardVertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Vertex buffer layout.
    #[must_use]
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Builds the card box. Six faces, CCW winding seen from outside.
#[must_use]
pub fn card_mesh() -> (Vec<CardVertex>, Vec<u16>) {
    let (hx, hy, hz) = (CARD_WIDTH * 0.5, CARD_HEIGHT * 0.5, CARD_DEPTH * 0.5);

    // (normal, four corners CCW from bottom-left, uvs)
    let faces: [([f32; 3], [[f32; 3]; 4], [[f32; 2]; 4]); 6] = [
        // Front (+z)
        (
            [0.0, 0.0, 1.0],
            [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]],
            [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        ),
        // Back (-z)
        (
            [0.0, 0.0, -1.0],
            [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]],
            [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        ),
        // Right (+x)
        (
            [1.0, 0.0, 0.0],
            [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]],
            [[1.0, 1.0]; 4],
        ),
        // Left (-x)
        (
            [-1.0, 0.0, 0.0],
            [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]],
            [[0.0, 1.0]; 4],
        ),
        // Top (+y)
        (
            [0.0, 1.0, 0.0],
            [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]],
            [[0.5, 0.0]; 4],
        ),
        // Bottom (-y)
        (
            [0.0, -1.0, 0.0],
            [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]],
            [[0.5, 1.0]; 4],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners, uvs) in faces {
        let base = vertices.len() as u16;
        for (position, uv) in corners.into_iter().zip(uvs) {
            vertices.push(CardVertex { position, normal, uv });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(CardVertex::SIZE, 32);
    }

    #[test]
    fn test_mesh_shape() {
        let (vertices, indices) = card_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_faces_wind_outwards() {
        let (vertices, indices) = card_mesh();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
            let e1 = [0, 1, 2].map(|k| b.position[k] - a.position[k]);
            let e2 = [0, 1, 2].map(|k| c.position[k] - a.position[k]);
            let n = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let dot: f32 = (0..3).map(|k| n[k] * a.normal[k]).sum();
            assert!(dot > 0.0);
        }
    }
}
