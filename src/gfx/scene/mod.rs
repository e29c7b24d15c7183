//! # Scene Graph
//!
//! The static town scene: a ground plane plus one group node per placed
//! model, each holding the model's parts as children.
//!
//! - [`Scene`] - root nodes and the shared mesh pool
//! - [`SceneNode`] - local transform, optional mesh, children
//! - [`Mesh`] - triangle data kept on the CPU for picking and uploaded for drawing
//! - [`Placement`] - where each model instance goes
//!
//! The scene is built once at startup and is read-only afterwards:
//!
//! ```no_run
//! use agentscape::config::SceneOptions;
//! use agentscape::gfx::{assets::AssetLibrary, scene::Scene};
//!
//! let options = SceneOptions::default();
//! let mut library = AssetLibrary::new(&options);
//! let scene = Scene::from_options(&options, &mut library).unwrap();
//! assert_eq!(scene.instances().count(), 11);
//! ```

pub mod mesh;
pub mod node;
pub mod placement;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use mesh::{DrawMesh, Mesh};
pub use node::{MeshId, NodeKind, NodeUniform, SceneNode};
pub use placement::Placement;
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
