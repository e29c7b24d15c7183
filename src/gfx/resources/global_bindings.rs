//! Global uniform bindings for camera and lighting data
//!
//! One uniform buffer, bound at group 0 in the scene and shadow pipelines,
//! holds the per-frame camera matrices and the scene lights.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    config::LightingOptions,
    gfx::camera::{camera_utils::CameraUniform, orbit_camera::OPENGL_TO_WGPU_MATRIX},
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// Half extent of the square area around the origin covered by the shadow map.
pub const SHADOW_EXTENT: f32 = 25.0;
/// How far back along the sun direction the shadow camera sits.
const SHADOW_DISTANCE: f32 = 30.0;

/// Global uniform buffer content.
///
/// MUST match the GlobalUniform struct in scene.wgsl exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],  // Camera position (homogeneous coordinates)
    view_proj: [[f32; 4]; 4], // Camera view-projection matrix
    light_view_proj: [[f32; 4]; 4], // Sun view-projection matrix for shadows
    light_direction: [f32; 4], // Direction light travels, w = intensity
    ambient: [f32; 4],        // rgb ambient color, w unused
}
// Total: 16 + 64 + 64 + 16 + 16 = 176 bytes

/// Directional sun plus uniform ambient term.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    /// Unit vector pointing from the sun towards the origin.
    pub direction: Vector3<f32>,
    pub intensity: f32,
    pub ambient: f32,
    /// Clip-space transform of the shadow pass.
    pub view_proj: Matrix4<f32>,
}

impl LightConfig {
    pub fn from_options(options: &LightingOptions) -> Self {
        let position = Vector3::from(options.sun_position);
        let direction = if position.magnitude2() > f32::EPSILON {
            -position.normalize()
        } else {
            -Vector3::unit_y()
        };
        Self {
            direction,
            intensity: options.sun_intensity,
            ambient: options.ambient_intensity,
            view_proj: shadow_view_proj(direction),
        }
    }
}

/// Orthographic sun camera looking at the origin along `direction`.
fn shadow_view_proj(direction: Vector3<f32>) -> Matrix4<f32> {
    let target = Point3::new(0.0, 0.0, 0.0);
    let eye = target - direction * SHADOW_DISTANCE;
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let light_view = Matrix4::look_at_rh(eye, target, up);
    let light_proj = cgmath::ortho(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        1.0,
        2.0 * SHADOW_DISTANCE,
    );
    OPENGL_TO_WGPU_MATRIX * light_proj * light_view
}

impl Default for LightConfig {
    fn default() -> Self {
        Self::from_options(&LightingOptions::default())
    }
}

impl GlobalUBOContent {
    pub fn new(camera: &CameraUniform, light: &LightConfig) -> Self {
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_view_proj: light.view_proj.into(),
            light_direction: [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                light.intensity,
            ],
            ambient: [light.ambient, light.ambient, light.ambient, 1.0],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Uploads this frame's camera and light data.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: &CameraUniform,
    light: &LightConfig,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, light));
}

/// Layout and bind group for the global uniform buffer, bound to slot 0.
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = binding_types::single_uniform_layout(
            device,
            "Globals Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 176);
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }

    #[test]
    fn sun_shines_towards_the_origin() {
        let light = LightConfig::default();
        let expected = -Vector3::new(10.0, 10.0, 5.0).normalize();
        assert!((light.direction - expected).magnitude() < 1e-6);
        assert_eq!(light.ambient, 0.3);

        let content = GlobalUBOContent::new(&CameraUniform::default(), &light);
        assert_eq!(content.light_direction[3], 1.0);
        assert_eq!(content.ambient[0], 0.3);
    }

    fn to_light_clip(light: &LightConfig, point: Vector3<f32>) -> cgmath::Vector4<f32> {
        light.view_proj * point.extend(1.0)
    }

    #[test]
    fn shadow_camera_covers_the_placements() {
        let light = LightConfig::default();

        let origin = to_light_clip(&light, Vector3::new(0.0, 0.0, 0.0));
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4);
        assert!(origin.z > 0.0 && origin.z < 1.0);

        // Corner building and a point above it stay inside the map.
        for point in [Vector3::new(-15.0, 0.0, -15.0), Vector3::new(-15.0, 5.0, -15.0)] {
            let clip = to_light_clip(&light, point);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{point:?}");
            assert!(clip.z >= 0.0 && clip.z <= 1.0, "{point:?}");
        }

        // Nearer the sun means smaller depth.
        let high = to_light_clip(&light, Vector3::new(0.0, 5.0, 0.0));
        assert!(high.z < origin.z);
    }

    #[test]
    fn overhead_sun_still_builds_a_shadow_camera() {
        let light = LightConfig::from_options(&LightingOptions {
            sun_position: [0.0, 10.0, 0.0],
            ..LightingOptions::default()
        });
        let origin = to_light_clip(&light, Vector3::new(0.0, 0.0, 0.0));
        assert!(origin.z.is_finite());
        assert!(origin.z > 0.0 && origin.z < 1.0);
    }
}
