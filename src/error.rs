//! Crate-level error types.

use std::path::PathBuf;

use crate::gfx::assets::AssetKind;

/// Errors produced by the agentscape crate.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// A model file could not be read or parsed.
    #[error("failed to load {kind} model from {}: {source}", path.display())]
    AssetLoad {
        kind: AssetKind,
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// Configuration file could not be parsed or holds invalid values.
    #[error("config error: {0}")]
    Config(String),

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The window surface could not be created or configured.
    #[error("surface error: {0}")]
    Surface(String),

    /// No GPU adapter compatible with the surface was found.
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The GPU device could not be opened.
    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// A render pipeline could not be built.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Event loop creation or execution failure.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ViewerError>;
