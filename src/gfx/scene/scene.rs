use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::Device;

use crate::{
    config::{parse_hex_color, SceneOptions},
    error::Result,
    gfx::{
        assets::{AssetKind, AssetLibrary},
        geometry::generate_plane,
    },
};

use super::{
    mesh::Mesh,
    node::{MeshId, NodeKind, SceneNode},
    placement::Placement,
};

/// The static scene graph: root nodes plus the pool of meshes they reference.
///
/// Built once when the viewport mounts and never modified afterwards, apart
/// from GPU resource creation.
pub struct Scene {
    pub roots: Vec<SceneNode>,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            meshes: Vec::new(),
        }
    }

    /// Builds the ground and every configured placement.
    ///
    /// Models that fail to load leave their instances empty; the error is
    /// logged and the rest of the scene is still built.
    pub fn from_options(options: &SceneOptions, library: &mut AssetLibrary) -> Result<Self> {
        let mut scene = Scene::new();
        scene.add_ground(options.ground_size, parse_hex_color(&options.ground_color)?);
        let empty = scene.populate(&options.placements, library);

        let stats = scene.get_statistics();
        log::info!(
            "Scene built: {} instances ({} empty), {} nodes, {} triangles",
            stats.instance_count,
            empty,
            stats.node_count,
            stats.total_triangles
        );
        Ok(scene)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn add_node(&mut self, node: SceneNode) {
        self.roots.push(node);
    }

    /// Adds a square ground plane of edge `size` lying at y = 0, facing up.
    pub fn add_ground(&mut self, size: f32, color: [f32; 4]) {
        let (vertices, indices) = generate_plane(size, size, 1, 1).to_scene_format();
        let mesh = self.add_mesh(Mesh::from_vertices(vertices, indices).with_color(color));
        self.add_node(SceneNode::new("ground", NodeKind::Ground).with_mesh(mesh));
    }

    /// Adds one group node per placement, with the model parts as children.
    ///
    /// Each asset kind is loaded once; its meshes are shared by all of its
    /// instances. Returns the number of instances left empty.
    pub fn populate(&mut self, placements: &[Placement], library: &mut AssetLibrary) -> usize {
        let mut loaded: HashMap<AssetKind, Option<Vec<(String, MeshId)>>> = HashMap::new();
        let mut counters: HashMap<AssetKind, usize> = HashMap::new();
        let mut empty = 0;

        for placement in placements {
            let kind = placement.asset;
            if !loaded.contains_key(&kind) {
                let parts = match library.load(kind) {
                    Ok(model) => {
                        let meshes: Vec<_> = model
                            .parts
                            .iter()
                            .map(|part| (part.name.clone(), part.to_mesh()))
                            .collect();
                        Some(
                            meshes
                                .into_iter()
                                .map(|(name, mesh)| (name, self.add_mesh(mesh)))
                                .collect(),
                        )
                    }
                    Err(e) => {
                        log::warn!("{e}; {kind} instances will render as absent");
                        None
                    }
                };
                loaded.insert(kind, parts);
            }

            let index = counters.entry(kind).or_insert(0);
            let mut node = SceneNode::new(format!("{kind}_{index}"), NodeKind::Instance(kind))
                .with_transform(placement.transform());
            *index += 1;

            match loaded.get(&kind) {
                Some(Some(parts)) => {
                    for (name, mesh) in parts {
                        node.add_child(SceneNode::new(name.clone(), NodeKind::Part).with_mesh(*mesh));
                    }
                }
                _ => empty += 1,
            }

            self.add_node(node);
        }

        empty
    }

    /// Depth-first pre-order walk over visible nodes with their world transforms.
    pub fn visit<'a>(&'a self, mut f: impl FnMut(&'a SceneNode, Matrix4<f32>)) {
        fn walk<'a>(
            node: &'a SceneNode,
            parent: Matrix4<f32>,
            f: &mut impl FnMut(&'a SceneNode, Matrix4<f32>),
        ) {
            if !node.visible {
                return;
            }
            let world = parent * node.transform;
            f(node, world);
            for child in &node.children {
                walk(child, world, f);
            }
        }

        for root in &self.roots {
            walk(root, Matrix4::identity(), &mut f);
        }
    }

    /// Top-level placed model instances, in placement order.
    pub fn instances(&self) -> impl Iterator<Item = &SceneNode> {
        self.roots
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Instance(_)))
    }

    /// Creates GPU buffers for every mesh and every mesh-bearing node.
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(&mut self, device: &Device, node_layout: &wgpu::BindGroupLayout) {
        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device);
        }

        fn init_node(
            node: &mut SceneNode,
            parent: Matrix4<f32>,
            meshes: &[Mesh],
            device: &Device,
            layout: &wgpu::BindGroupLayout,
        ) {
            let world = parent * node.transform;
            if let Some(mesh) = node.mesh.and_then(|id| meshes.get(id.0)) {
                let color = mesh.color();
                node.init_gpu_resources(device, layout, world, color);
            }
            for child in node.children.iter_mut() {
                init_node(child, world, meshes, device, layout);
            }
        }

        for root in self.roots.iter_mut() {
            init_node(root, Matrix4::identity(), &self.meshes, device, node_layout);
        }
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics {
            node_count: self.roots.iter().map(SceneNode::subtree_len).sum(),
            instance_count: self.instances().count(),
            mesh_count: self.meshes.len(),
            total_triangles: 0,
            total_vertices: 0,
        };
        self.visit(|node, _| {
            if let Some(mesh) = node.mesh.and_then(|id| self.mesh(id)) {
                stats.total_triangles += mesh.triangle_count();
                stats.total_vertices += mesh.vertices().len();
            }
        });
        stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene statistics for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub instance_count: usize,
    pub mesh_count: usize,
    /// Drawn triangles; shared meshes count once per instance.
    pub total_triangles: usize,
    pub total_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        assets::{Model, ModelPart},
        scene::vertex::Vertex3D,
    };
    use std::{collections::HashSet, path::PathBuf};

    fn missing_assets() -> AssetLibrary {
        let mut options = SceneOptions::default();
        options.asset_root = PathBuf::from("no/such/asset/root");
        AssetLibrary::new(&options)
    }

    fn triangle_model(name: &str) -> Model {
        Model {
            parts: vec![ModelPart {
                name: name.to_string(),
                vertices: Vertex3D::interleave(
                    &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    &[],
                ),
                indices: vec![0, 1, 2],
                color: [1.0, 0.0, 0.0, 1.0],
            }],
        }
    }

    #[test]
    fn default_layout_places_every_instance_once() {
        let mut library = missing_assets();
        let scene = Scene::from_options(&SceneOptions::default(), &mut library).unwrap();

        let instances: Vec<_> = scene.instances().collect();
        assert_eq!(instances.len(), 11);

        let mut seen = HashSet::new();
        for node in &instances {
            let p = node.position();
            assert!(
                seen.insert((p[0].to_bits(), p[1].to_bits(), p[2].to_bits())),
                "duplicate instance at {p:?}"
            );
        }

        for placement in Placement::default_layout() {
            assert!(
                instances.iter().any(|node| node.kind == NodeKind::Instance(placement.asset)
                    && node.position() == placement.position),
                "missing {:?}",
                placement
            );
        }

        let count = |kind| {
            instances
                .iter()
                .filter(|n| n.kind == NodeKind::Instance(kind))
                .count()
        };
        assert_eq!(count(AssetKind::Tree), 6);
        assert_eq!(count(AssetKind::Building), 3);
        assert_eq!(count(AssetKind::Agent), 2);
    }

    #[test]
    fn missing_models_leave_empty_instances() {
        let mut scene = Scene::new();
        let empty = scene.populate(&Placement::default_layout(), &mut missing_assets());
        assert_eq!(empty, 11);
        assert!(scene.instances().all(|node| node.children.is_empty()));
        assert_eq!(scene.get_statistics().total_triangles, 0);
    }

    #[test]
    fn loaded_models_are_shared_between_instances() {
        let mut library = missing_assets();
        library.insert(AssetKind::Tree, triangle_model("crown"));

        let mut scene = Scene::new();
        let empty = scene.populate(&Placement::default_layout(), &mut library);
        assert_eq!(empty, 5);

        let trees: Vec<_> = scene
            .instances()
            .filter(|n| n.kind == NodeKind::Instance(AssetKind::Tree))
            .collect();
        assert_eq!(trees.len(), 6);
        let first_mesh = trees[0].children[0].mesh;
        assert!(trees.iter().all(|t| t.children[0].mesh == first_mesh));

        let stats = scene.get_statistics();
        assert_eq!(stats.mesh_count, 1);
        assert_eq!(stats.total_triangles, 6);
        assert_eq!(stats.node_count, 11 + 6);
    }

    #[test]
    fn instance_names_are_unique() {
        let mut scene = Scene::new();
        scene.populate(&Placement::default_layout(), &mut missing_assets());
        let names: HashSet<_> = scene.instances().map(|n| n.name.clone()).collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains("tree_5"));
        assert!(names.contains("agent_1"));
    }

    #[test]
    fn visit_composes_parent_transforms() {
        let mut library = missing_assets();
        library.insert(AssetKind::Agent, triangle_model("body"));

        let mut scene = Scene::new();
        scene.populate(&[Placement::new(AssetKind::Agent, [2.0, 0.0, 2.0])], &mut library);

        let mut worlds = Vec::new();
        scene.visit(|node, world| worlds.push((node.kind, world)));
        assert_eq!(worlds.len(), 2);

        let (kind, world) = worlds[1];
        assert_eq!(kind, NodeKind::Part);
        assert!((world.x.x - 0.2).abs() < 1e-6);
        assert!((world.w.x - 2.0).abs() < 1e-6);
        assert!((world.w.z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn ground_is_a_single_upward_quad() {
        let mut scene = Scene::new();
        scene.add_ground(200.0, [0.75, 1.0, 0.5, 1.0]);
        let ground = &scene.roots[0];
        assert_eq!(ground.kind, NodeKind::Ground);
        let mesh = scene.mesh(ground.mesh.unwrap()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounds().min.x, -100.0);
        assert_eq!(mesh.bounds().max.z, 100.0);
        assert!(mesh.vertices().iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }
}
