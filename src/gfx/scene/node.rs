use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::Device;

use crate::{gfx::assets::AssetKind, wgpu_utils::uniform_buffer::UniformBuffer};

/// Index of a mesh in the scene's mesh pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// What a node stands for in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Ground,
    /// Group node of one placed model.
    Instance(AssetKind),
    /// One part of a loaded model, child of an instance.
    Part,
}

/// Per-node uniform: world transform, normal matrix and surface color.
/// MUST match `NodeUniform` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub shadow: [f32; 4], // x = 1.0 when the node receives the sun's shadow
}
// Total: 64 + 64 + 16 + 16 = 160 bytes

impl NodeUniform {
    pub fn new(world: Matrix4<f32>, color: [f32; 4], receives_shadow: bool) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: world.into(),
            normal: normal.into(),
            color,
            shadow: [if receives_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

pub struct NodeGpuResources {
    pub uniform: UniformBuffer<NodeUniform>,
    pub bind_group: wgpu::BindGroup,
}

/// A scene graph node: local transform, optional mesh and children.
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Matrix4<f32>, // local, relative to the parent
    pub mesh: Option<MeshId>,
    pub children: Vec<SceneNode>,
    pub visible: bool,
    gpu_resources: Option<NodeGpuResources>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Translation column of the local transform.
    pub fn position(&self) -> [f32; 3] {
        [self.transform.w.x, self.transform.w.y, self.transform.w.z]
    }

    /// Number of nodes in this subtree, itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }

    /// Creates the uniform buffer and bind group of a mesh-bearing node.
    pub(crate) fn init_gpu_resources(
        &mut self,
        device: &Device,
        layout: &wgpu::BindGroupLayout,
        world: Matrix4<f32>,
        color: [f32; 4],
    ) {
        // Only the ground samples the shadow map.
        let receives_shadow = self.kind == NodeKind::Ground;
        let uniform = UniformBuffer::new_with_data(
            device,
            &NodeUniform::new(world, color, receives_shadow),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Node Bind Group: {}", self.name)),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.binding_resource(),
            }],
        });
        self.gpu_resources = Some(NodeGpuResources {
            uniform,
            bind_group,
        });
    }
}
