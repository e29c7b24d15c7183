//! # agentscape Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use agentscape::prelude::*;
//!
//! fn main() -> Result<()> {
//!     ViewerApp::new(ViewerConfig::default())?.run()
//! }
//! ```

pub use crate::app::ViewerApp;
pub use crate::config::ViewerConfig;
pub use crate::error::{Result, ViewerError};

pub use crate::gfx::camera::{CameraManager, CameraView, FocusHandle, OrbitCamera};
pub use crate::gfx::geometry::{generate_cube, generate_plane, GeometryData};
pub use crate::gfx::picking::{Intersection, ObjectPicker, Ray};
pub use crate::gfx::scene::{Placement, Scene, SceneNode};
pub use crate::input::{ListenerGuard, PointerEvent, PointerListeners, ViewportRect};
pub use crate::interaction::{FocusOutcome, FocusResolver};
