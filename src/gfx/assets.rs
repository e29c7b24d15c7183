//! # Model Assets
//!
//! Loads the three external models the scene is composed of (tree, building,
//! agent) from OBJ files. Each asset is read at most once per library; every
//! placement of the same kind shares the parsed parts.
//!
//! A model that fails to load is reported as [`ViewerError::AssetLoad`]. The
//! library does not retry and has no fallback model.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    config::SceneOptions,
    error::{Result, ViewerError},
    gfx::scene::{mesh::Mesh, vertex::Vertex3D},
};

/// Diffuse color used when a model has no material.
const DEFAULT_PART_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// The external models the scene places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Tree,
    Building,
    Agent,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Tree, AssetKind::Building, AssetKind::Agent];

    /// Model path relative to the asset root.
    pub fn default_path(self) -> PathBuf {
        let file = match self {
            AssetKind::Tree => "tree.obj",
            AssetKind::Building => "building.obj",
            AssetKind::Agent => "robot.obj",
        };
        Path::new("models").join(file)
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Tree => "tree",
            AssetKind::Building => "building",
            AssetKind::Agent => "agent",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One sub-model of an OBJ file: a single mesh with its diffuse color.
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub name: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
}

impl ModelPart {
    /// Builds the scene-side mesh for this part.
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from_vertices(self.vertices.clone(), self.indices.clone()).with_color(self.color)
    }
}

/// A parsed model, possibly made of several parts.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub parts: Vec<ModelPart>,
}

impl Model {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.indices.len() / 3).sum()
    }
}

/// Cache of loaded models keyed by asset kind.
pub struct AssetLibrary {
    paths: HashMap<AssetKind, PathBuf>,
    models: HashMap<AssetKind, Model>,
}

impl AssetLibrary {
    /// Creates a library resolving each kind through the scene options.
    pub fn new(options: &SceneOptions) -> Self {
        let paths = AssetKind::ALL
            .iter()
            .map(|&kind| (kind, options.model_path(kind)))
            .collect();
        Self {
            paths,
            models: HashMap::new(),
        }
    }

    /// Registers an already-built model, replacing any cached one.
    pub fn insert(&mut self, kind: AssetKind, model: Model) {
        self.models.insert(kind, model);
    }

    /// Returns the model for `kind`, loading it from disk on first use.
    pub fn load(&mut self, kind: AssetKind) -> Result<&Model> {
        if !self.models.contains_key(&kind) {
            let path = self
                .paths
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| kind.default_path());
            let model = load_obj_model(kind, &path)?;
            log::info!(
                "Loaded {} model from {} ({} parts, {} triangles)",
                kind,
                path.display(),
                model.parts.len(),
                model.triangle_count()
            );
            self.models.insert(kind, model);
        }
        Ok(&self.models[&kind])
    }
}

/// Reads an OBJ file (and its MTL, when present) into a [`Model`].
pub fn load_obj_model(kind: AssetKind, path: &Path) -> Result<Model> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| ViewerError::AssetLoad {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::debug!("No materials for {}: {e}", path.display());
        Vec::new()
    });

    let parts = models
        .into_iter()
        .enumerate()
        .map(|(i, model)| {
            let mesh = model.mesh;
            let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len()
            {
                mesh.normals
            } else {
                Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
            };

            let color = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|mtl| {
                    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                    [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)]
                })
                .unwrap_or(DEFAULT_PART_COLOR);

            let name = if model.name.is_empty() {
                format!("{kind}_part_{i}")
            } else {
                model.name
            };

            ModelPart {
                name,
                vertices: Vertex3D::interleave(&mesh.positions, &normals),
                indices: mesh.indices,
                color,
            }
        })
        .collect();

    Ok(Model { parts })
}
