//! Fixed instance placements of the town scene.

use cgmath::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::gfx::assets::AssetKind;

/// Model reference, world position and uniform scale of one scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub asset: AssetKind,
    pub position: [f32; 3],
    pub scale: f32,
}

impl Placement {
    pub const fn new(asset: AssetKind, position: [f32; 3]) -> Self {
        Self {
            asset,
            position,
            scale: asset.default_scale(),
        }
    }

    /// Translation then uniform scale.
    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::from(self.position)) * Matrix4::from_scale(self.scale)
    }

    /// Six trees, three buildings and two agents.
    pub fn default_layout() -> Vec<Placement> {
        use AssetKind::*;
        vec![
            Placement::new(Tree, [-10.0, 0.0, -5.0]),
            Placement::new(Tree, [-5.0, 0.0, -10.0]),
            Placement::new(Tree, [0.0, 0.0, -15.0]),
            Placement::new(Tree, [5.0, 0.0, -5.0]),
            Placement::new(Tree, [10.0, 0.0, -10.0]),
            Placement::new(Tree, [15.0, 0.0, -5.0]),
            Placement::new(Building, [-15.0, 0.0, -15.0]),
            Placement::new(Building, [10.0, 0.0, 5.0]),
            Placement::new(Building, [0.0, 0.0, 12.0]),
            Placement::new(Agent, [0.0, 0.0, 0.0]),
            Placement::new(Agent, [2.0, 0.0, 2.0]),
        ]
    }
}

impl AssetKind {
    /// Scale the source models are authored for.
    pub const fn default_scale(self) -> f32 {
        match self {
            AssetKind::Tree => 0.03,
            AssetKind::Building => 0.1,
            AssetKind::Agent => 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn default_layout_counts_per_kind() {
        let layout = Placement::default_layout();
        let count = |kind| layout.iter().filter(|p| p.asset == kind).count();
        assert_eq!(layout.len(), 11);
        assert_eq!(count(AssetKind::Tree), 6);
        assert_eq!(count(AssetKind::Building), 3);
        assert_eq!(count(AssetKind::Agent), 2);
    }

    #[test]
    fn transform_scales_about_the_placement_origin() {
        let placement = Placement::new(AssetKind::Building, [10.0, 0.0, 5.0]);
        let corner = placement.transform() * Vector4::new(10.0, 20.0, 0.0, 1.0);
        assert!((corner.x - 11.0).abs() < 1e-5);
        assert!((corner.y - 2.0).abs() < 1e-5);
        assert!((corner.z - 5.0).abs() < 1e-5);
    }
}
