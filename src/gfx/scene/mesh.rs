use wgpu::Device;

use crate::gfx::picking::AABB;

use super::vertex::Vertex3D;

/// Vertex and index buffers of an uploaded mesh.
pub struct MeshGpuResources {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

/// Triangle mesh with its base color and local-space bounds.
///
/// CPU data is kept after upload; picking runs against it.
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    color: [f32; 4],
    bounds: AABB,
    pub(crate) index_count: u32,
    gpu_resources: Option<MeshGpuResources>, // None until init_gpu_resources called
}

impl Mesh {
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        Self::from_vertices(Vertex3D::interleave(&positions, &normals), indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        Self {
            bounds: AABB::from_vertices(&positions),
            index_count: indices.len() as u32,
            vertices,
            indices,
            color: [0.8, 0.8, 0.8, 1.0],
            gpu_resources: None,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Local-space bounding box.
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the triangles as position triples. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([a.position, b.position, c.position])
        })
    }

    pub fn gpu_resources(&self) -> Option<&MeshGpuResources> {
        self.gpu_resources.as_ref()
    }

    /// Averages face normals into per-vertex normals, for files that ship without them.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; vertex_count * 3];

        let position = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let (v0, v1, v2) = (position(i0), position(i1), position(i2));
            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal[0];
                normals[vertex_idx * 3 + 1] += face_normal[1];
                normals[vertex_idx * 3 + 2] += face_normal[2];
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|n| *n /= length);
            }
        }

        normals
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return;
        }

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        self.gpu_resources = Some(MeshGpuResources {
            vertex_buffer,
            index_buffer,
        });
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        // Skip drawing if not uploaded
        let Some(gpu) = mesh.gpu_resources() else {
            return;
        };

        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
