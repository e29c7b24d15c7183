//! # Graphics Module
//!
//! Camera, scene graph, model loading, ray picking and the wgpu renderer.
//!
//! - **Camera System** ([`camera`]) - orbit camera with drag and zoom controls
//! - **Scene Management** ([`scene`]) - static scene graph and shared meshes
//! - **Assets** ([`assets`]) - OBJ model loading
//! - **Picking** ([`picking`]) - pointer rays and ray/mesh intersection
//! - **Rendering Pipeline** ([`rendering`]) - depth-tested Lambert shading

pub mod assets;
pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
