//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by loaded models and procedural
//! geometry.

/// A 3D vertex with position and normal data.
///
/// `#[repr(C)]` keeps the layout stable for vertex buffer uploads.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
}

impl Vertex3D {
    /// Zips flat position and normal arrays (three floats per vertex).
    ///
    /// Vertices without a matching normal get `+Y`.
    pub fn interleave(positions: &[f32], normals: &[f32]) -> Vec<Vertex3D> {
        positions
            .chunks_exact(3)
            .enumerate()
            .map(|(i, p)| {
                let normal = normals
                    .get(i * 3..i * 3 + 3)
                    .map(|n| [n[0], n[1], n[2]])
                    .unwrap_or([0.0, 1.0, 0.0]);
                Vertex3D {
                    position: [p[0], p[1], p[2]],
                    normal,
                }
            })
            .collect()
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3) at shader location 0
    /// - Attribute 1: Normal (Float32x3) at shader location 1
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
