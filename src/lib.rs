//! agentscape
//!
//! A static 3D town scene viewer built on wgpu and winit: orbit camera
//! controls plus double-click to focus the camera on the clicked surface.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod interaction;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
