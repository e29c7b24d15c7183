use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use winit::event::WindowEvent;

use crate::config::CameraOptions;

use super::{
    camera_controller::CameraController,
    orbit_camera::{OrbitCamera, OrbitCameraBounds},
};

/// Camera state shared between the render loop and the interaction handlers.
///
/// The render path holds the owning [`SharedCamera`]; handlers receive a
/// [`FocusHandle`] instead.
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

/// Owning handle on the camera state. Single-threaded by construction.
pub type SharedCamera = Rc<RefCell<CameraManager>>;

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Builds the camera and its controls from configuration.
    pub fn from_options(options: &CameraOptions, aspect: f32) -> Self {
        let bounds = OrbitCameraBounds {
            min_distance: options.min_distance,
            max_distance: options.max_distance,
            ..OrbitCameraBounds::default()
        };
        let camera = OrbitCamera::looking_at(
            Vector3::from(options.position),
            Vector3::from(options.target),
            aspect,
        )
        .with_projection(
            Rad::from(cgmath::Deg(options.fov_degrees)),
            options.znear,
            options.zfar,
        )
        .with_bounds(bounds);
        let controller = CameraController::new(options.rotate_speed, options.zoom_speed)
            .with_enabled(options.enable_rotate, options.enable_zoom);
        Self::new(camera, controller)
    }

    pub fn into_shared(self) -> SharedCamera {
        Rc::new(RefCell::new(self))
    }

    /// Feeds a window event to the orbit controller.
    ///
    /// Returns true if the camera moved.
    pub fn process_event(&mut self, event: &WindowEvent) -> bool {
        self.controller.process_events(event, &mut self.camera)
    }
}

/// Narrow capability over the shared camera: read the pose, move the target.
///
/// Holds only a weak reference. Once the viewport drops its camera every call
/// becomes a no-op.
#[derive(Clone, Default)]
pub struct FocusHandle {
    camera: Weak<RefCell<CameraManager>>,
}

impl FocusHandle {
    pub fn new(camera: &SharedCamera) -> Self {
        Self {
            camera: Rc::downgrade(camera),
        }
    }

    /// A handle with no camera behind it, as before the viewport mounts.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Current camera pose and projection, or `None` if the camera is gone
    /// or busy.
    pub fn view(&self) -> Option<CameraView> {
        let camera = self.camera.upgrade()?;
        let manager = camera.try_borrow().ok()?;
        Some(manager.camera.view())
    }

    /// Moves the orbit target and recomputes the camera transform.
    ///
    /// Returns false, leaving everything untouched, if the camera is gone.
    pub fn set_target(&self, target: Vector3<f32>) -> bool {
        let Some(camera) = self.camera.upgrade() else {
            return false;
        };
        let Ok(mut manager) = camera.try_borrow_mut() else {
            return false;
        };
        manager.camera.set_target(target);
        true
    }
}

/// Snapshot of a camera pose and perspective projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Rad<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl CameraView {
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(Point3::from_vec(self.eye), Point3::from_vec(self.target), self.up)
    }

    /// OpenGL-convention perspective (NDC depth in [-1, 1]).
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye).normalize()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_camera() -> SharedCamera {
        let camera = OrbitCamera::looking_at(
            Vector3::new(5.0, 5.0, 5.0),
            Vector3::new(0.0, 0.0, 0.0),
            1.5,
        );
        CameraManager::new(camera, CameraController::new(0.005, 0.1)).into_shared()
    }

    #[test]
    fn default_options_start_at_the_configured_pose() {
        let manager = CameraManager::from_options(&CameraOptions::default(), 1.5);
        let view = manager.camera.view();
        assert!((view.eye - Vector3::new(5.0, 5.0, 5.0)).magnitude() < 1e-4);
        assert_eq!(view.target, Vector3::new(0.0, 0.0, 0.0));
        assert!((view.fovy.0 - std::f32::consts::FRAC_PI_3).abs() < 1e-5);
        assert_eq!(manager.camera.bounds.max_distance, Some(250.0));
    }

    #[test]
    fn focus_handle_moves_the_shared_target() {
        let shared = shared_camera();
        let handle = FocusHandle::new(&shared);

        assert!(handle.set_target(Vector3::new(1.0, 0.0, 2.0)));
        assert_eq!(shared.borrow().camera.target, Vector3::new(1.0, 0.0, 2.0));
        assert_eq!(handle.view().unwrap().target, Vector3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn focus_handle_outliving_the_camera_is_inert() {
        let shared = shared_camera();
        let handle = FocusHandle::new(&shared);
        drop(shared);

        assert!(handle.view().is_none());
        assert!(!handle.set_target(Vector3::new(1.0, 0.0, 0.0)));
        assert!(FocusHandle::detached().view().is_none());
    }

    #[test]
    fn focus_handle_skips_a_busy_camera() {
        let shared = shared_camera();
        let handle = FocusHandle::new(&shared);
        let _render_borrow = shared.borrow_mut();
        assert!(handle.view().is_none());
        assert!(!handle.set_target(Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn view_matrix_maps_target_onto_the_negative_z_axis() {
        let view = shared_camera().borrow().camera.view();
        let target = view.view_matrix() * view.target.extend(1.0);
        assert!(target.x.abs() < 1e-4 && target.y.abs() < 1e-4);
        assert!((target.z + 75f32.sqrt()).abs() < 1e-4);
    }
}
