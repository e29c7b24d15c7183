//! Viewer configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the values it
//! overrides. [`ViewerConfig::default`] is the built-in town scene.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ViewerError},
    gfx::{assets::AssetKind, scene::placement::Placement},
};

/// Top-level configuration container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowOptions,
    pub camera: CameraOptions,
    pub input: InputOptions,
    pub lighting: LightingOptions,
    pub scene: SceneOptions,
}

impl ViewerConfig {
    /// Load a configuration from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let fov = self.camera.fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ViewerError::Config(format!(
                "camera.fov_degrees must be in (0, 180), got {fov}"
            )));
        }
        if self.camera.znear <= 0.0 || self.camera.zfar <= self.camera.znear {
            return Err(ViewerError::Config(
                "camera clip planes must satisfy 0 < znear < zfar".to_string(),
            ));
        }
        if self.camera.position == self.camera.target {
            return Err(ViewerError::Config(
                "camera.position must differ from camera.target".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.camera.min_distance, self.camera.max_distance) {
            if min > max {
                return Err(ViewerError::Config(format!(
                    "camera.min_distance ({min}) exceeds camera.max_distance ({max})"
                )));
            }
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ViewerError::Config("window size must be non-zero".to_string()));
        }
        parse_hex_color(&self.scene.ground_color)?;
        parse_hex_color(&self.lighting.sky_color)?;
        Ok(())
    }
}

/// Window title and initial size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "agentscape".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

/// Initial camera placement, projection and orbit control parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Initial eye position in world space.
    pub position: [f32; 3],
    /// Initial orbit target.
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Radians of orbit per dragged pixel.
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line.
    pub zoom_speed: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 60.0,
            znear: 0.1,
            zfar: 1000.0,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            enable_rotate: true,
            enable_zoom: true,
            min_distance: Some(0.5),
            max_distance: Some(250.0),
        }
    }
}

/// Pointer gesture thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputOptions {
    /// Maximum delay between the two presses of a double-click.
    pub double_click_ms: u64,
    /// Maximum pointer travel, in pixels, between the two presses.
    pub double_click_slop: f32,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            double_click_ms: 400,
            double_click_slop: 6.0,
        }
    }
}

/// Ambient and directional light parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingOptions {
    pub ambient_intensity: f32,
    /// Position of the directional light; it shines towards the origin.
    pub sun_position: [f32; 3],
    pub sun_intensity: f32,
    /// Clear color behind the scene, as `#rrggbb`.
    pub sky_color: String,
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.3,
            sun_position: [10.0, 10.0, 5.0],
            sun_intensity: 1.0,
            sky_color: "#f2c18d".to_string(),
        }
    }
}

/// Scene content: ground plane, model paths and instance placements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    /// Directory model paths are resolved against.
    pub asset_root: PathBuf,
    pub tree_model: PathBuf,
    pub building_model: PathBuf,
    pub agent_model: PathBuf,
    /// Edge length of the square ground plane.
    pub ground_size: f32,
    /// Ground color, as `#rrggbb`.
    pub ground_color: String,
    pub placements: Vec<Placement>,
}

impl SceneOptions {
    /// Full path of the model file for `kind`.
    pub fn model_path(&self, kind: AssetKind) -> PathBuf {
        let relative = match kind {
            AssetKind::Tree => &self.tree_model,
            AssetKind::Building => &self.building_model,
            AssetKind::Agent => &self.agent_model,
        };
        self.asset_root.join(relative)
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            tree_model: AssetKind::Tree.default_path(),
            building_model: AssetKind::Building.default_path(),
            agent_model: AssetKind::Agent.default_path(),
            ground_size: 200.0,
            ground_color: "#bfff80".to_string(),
            placements: Placement::default_layout(),
        }
    }
}

/// Parses a `#rrggbb` color into RGBA floats with full opacity.
pub fn parse_hex_color(hex: &str) -> Result<[f32; 4]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ViewerError::Config(format!("invalid color '{hex}'")));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ViewerError::Config(format!("invalid color '{hex}'")))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0])
}
