//! Per-geometry GPU buffers.

use glimmer_core::Geometry;

use crate::buffer::{create_index_buffer, create_vertex_buffer};

/// Vertex layout shared by the fill and line pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Buffer layout matching `VertexInput` in the scene shader.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleaves positions and normals. Missing normals become zero.
pub fn mesh_vertices(geometry: &Geometry) -> Vec<MeshVertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| MeshVertex {
            position: p.to_array(),
            normal: geometry
                .normals
                .get(i)
                .map_or([0.0; 3], |n| n.to_array()),
        })
        .collect()
}

/// GPU resources for one geometry: shared vertices, a triangle index list for
/// solid drawing and an edge index list for wireframe drawing.
pub struct MeshRenderData {
    pub vertex_buffer: wgpu::Buffer,
    pub triangle_index_buffer: wgpu::Buffer,
    pub edge_index_buffer: wgpu::Buffer,
    pub num_triangle_indices: u32,
    pub num_edge_indices: u32,
}

impl MeshRenderData {
    pub fn new(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertices = mesh_vertices(geometry);
        let triangle_indices: Vec<u32> = geometry.triangles.iter().flatten().copied().collect();
        let edge_indices: Vec<u32> = geometry.edges().into_iter().flatten().collect();

        Self {
            vertex_buffer: create_vertex_buffer(device, &vertices, Some("mesh vertices")),
            triangle_index_buffer: create_index_buffer(
                device,
                &triangle_indices,
                Some("mesh triangle indices"),
            ),
            edge_index_buffer: create_index_buffer(device, &edge_indices, Some("mesh edge indices")),
            num_triangle_indices: triangle_indices.len() as u32,
            num_edge_indices: edge_indices.len() as u32,
        }
    }

    /// Index buffer and count for the requested primitive kind.
    pub fn indices(&self, wireframe: bool) -> (&wgpu::Buffer, u32) {
        if wireframe {
            (&self.edge_index_buffer, self.num_edge_indices)
        } else {
            (&self.triangle_index_buffer, self.num_triangle_indices)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_vertex_layout_stride() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
        assert_eq!(MeshVertex::layout().array_stride, 24);
    }

    #[test]
    fn test_vertices_interleave_normals() {
        let plane = Geometry::plane(2.0, 2.0);
        let vertices = mesh_vertices(&plane);
        assert_eq!(vertices.len(), plane.positions.len());
        for v in &vertices {
            assert_eq!(v.position[2], 0.0);
            assert_eq!(Vec3::from_array(v.normal), Vec3::Z);
        }
    }
}
