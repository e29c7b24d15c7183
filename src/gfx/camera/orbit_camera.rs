use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform, CameraView};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Orbits the eye around `target` on a sphere of radius `distance`.
///
/// Y is up. `pitch` is the elevation above the XZ plane and `yaw` the heading
/// measured from +Z towards +X.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.view().projection_matrix() * self.view().view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 3.0),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Places the camera at `eye`, looking at `target`.
    pub fn looking_at(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self::new(1.0, 0.0, 0.0, target, aspect);
        camera.eye = eye;
        camera.sync_from_eye();
        camera
    }

    pub fn with_projection(mut self, fovy: Rad<f32>, znear: f32, zfar: f32) -> Self {
        self.fovy = fovy;
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn with_bounds(mut self, bounds: OrbitCameraBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = self.bounds.clamp_distance(distance);
        self.update();
    }

    /// Scales the distance by `1 + delta`; negative deltas move closer.
    pub fn add_distance(&mut self, delta: f32) {
        let factor = (1.0 + delta).max(0.1);
        self.set_distance(self.distance * factor);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Moves the orbit center to `target` and re-aims the camera at it at once.
    ///
    /// The eye keeps its direction from the target; distance, pitch and yaw
    /// are re-derived from it, so the next frame is centered on the new
    /// target. The distance is clamped to the zoom bounds, which may slide
    /// the eye along that line.
    pub fn set_target(&mut self, target: Vector3<f32>) {
        self.target = target;
        self.sync_from_eye();
    }

    /// Recomputes the spherical coordinates from the current eye and target.
    fn sync_from_eye(&mut self) {
        let offset = self.eye - self.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            // Eye on the target: keep the previous orientation.
            self.update();
            return;
        }
        self.distance = self.bounds.clamp_distance(distance);
        self.pitch = (offset.y / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.yaw = offset.x.atan2(offset.z);
        self.update();
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Read-only snapshot of the pose and projection.
    pub fn view(&self) -> CameraView {
        CameraView {
            eye: self.eye,
            target: self.target,
            up: self.up,
            fovy: self.fovy,
            aspect: self.aspect,
            znear: self.znear,
            zfar: self.zfar,
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl OrbitCameraBounds {
    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(
            self.min_distance.unwrap_or(f32::EPSILON),
            self.max_distance.unwrap_or(f32::MAX),
        )
    }
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 0.001,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.001,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn looking_at_preserves_the_eye() {
        let camera = OrbitCamera::looking_at(Vector3::new(5.0, 5.0, 5.0), Vector3::zero(), 1.5);
        assert!(approx(camera.eye, Vector3::new(5.0, 5.0, 5.0)));
        assert!((camera.distance - 75f32.sqrt()).abs() < 1e-4);
        assert!((camera.yaw - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn set_target_keeps_eye_and_reaims() {
        let mut camera = OrbitCamera::looking_at(Vector3::new(5.0, 5.0, 5.0), Vector3::zero(), 1.5);
        let target = Vector3::new(-10.0, 0.0, -5.0);
        camera.set_target(target);

        assert_eq!(camera.target, target);
        assert!(approx(camera.eye, Vector3::new(5.0, 5.0, 5.0)));
        assert!(approx(camera.view().forward(), (target - camera.eye).normalize()));
        assert!((camera.distance - (camera.eye - target).magnitude()).abs() < 1e-4);
    }

    #[test]
    fn orbiting_keeps_distance_to_the_target() {
        let target = Vector3::new(2.0, 0.0, 2.0);
        let mut camera = OrbitCamera::looking_at(Vector3::new(5.0, 5.0, 5.0), target, 1.0);
        let distance = camera.distance;
        camera.add_yaw(0.7);
        camera.add_pitch(-0.2);
        assert!(((camera.eye - target).magnitude() - distance).abs() < 1e-4);
    }

    #[test]
    fn pitch_stops_short_of_the_poles() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.add_pitch(10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.eye.x.abs() > 0.0 || camera.eye.z.abs() > 0.0);
    }

    #[test]
    fn zoom_is_bounded() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.0, Vector3::zero(), 1.0).with_bounds(
            OrbitCameraBounds {
                min_distance: Some(2.0),
                max_distance: Some(8.0),
                ..Default::default()
            },
        );
        for _ in 0..50 {
            camera.add_distance(-0.5);
        }
        assert!((camera.distance - 2.0).abs() < 1e-6);
        for _ in 0..50 {
            camera.add_distance(0.5);
        }
        assert!((camera.distance - 8.0).abs() < 1e-6);
    }

    #[test]
    fn retarget_stays_within_zoom_bounds() {
        let bounds = OrbitCameraBounds {
            min_distance: Some(0.5),
            max_distance: Some(250.0),
            ..Default::default()
        };
        let mut camera =
            OrbitCamera::looking_at(Vector3::new(0.0, 10.0, 249.0), Vector3::zero(), 1.5)
                .with_bounds(bounds);
        let old_eye = camera.eye;

        let target = Vector3::new(-100.0, 0.0, -100.0);
        camera.set_target(target);
        assert!((camera.distance - 250.0).abs() < 1e-3);
        assert!(((camera.eye - target).magnitude() - 250.0).abs() < 1e-2);
        // Pulled in along the original line of sight.
        assert!(approx(
            (camera.eye - target).normalize(),
            (old_eye - target).normalize()
        ));

        let before = camera.distance;
        camera.add_distance(0.1);
        assert!(camera.distance >= before - 1e-3);

        camera.set_target(camera.eye + Vector3::new(0.0, 0.1, 0.0));
        assert!((camera.distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn eye_on_target_keeps_orientation() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.2, Vector3::zero(), 1.0);
        let eye = camera.eye;
        camera.set_target(eye);
        assert!((camera.distance - 5.0).abs() < 1e-6);
        assert!((camera.pitch - 0.3).abs() < 1e-6);
    }
}
