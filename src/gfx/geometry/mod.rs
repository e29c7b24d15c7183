//! # Procedural Geometry Generation
//!
//! Primitive shapes generated in code, for scene content that does not come
//! from a model file (the ground plane).
//!
//! ```rust
//! use agentscape::gfx::geometry::generate_plane;
//!
//! // A 200x200 ground plane made of a single quad
//! let ground = generate_plane(200.0, 200.0, 1, 1);
//! assert_eq!(ground.triangle_count(), 2);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Generated geometry ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts to the interleaved vertex format used by the renderer
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
