use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use super::orbit_camera::OrbitCamera;

/// Pixels of trackpad scroll treated as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

/// Orbit controls: left-drag rotates, wheel and pinch zoom.
///
/// Panning is not offered, so the orbit target only moves through focus
/// requests.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    is_mouse_pressed: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            enable_rotate: true,
            enable_zoom: true,
            is_mouse_pressed: false,
            last_cursor: None,
        }
    }

    pub fn with_enabled(mut self, rotate: bool, zoom: bool) -> Self {
        self.enable_rotate = rotate;
        self.enable_zoom = zoom;
        self
    }

    /// Applies one window event to `camera`. Returns true if the camera moved.
    pub fn process_events(&mut self, event: &WindowEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.last_cursor.replace(*position);
                match previous {
                    Some(previous) if self.is_mouse_pressed && self.enable_rotate => {
                        let dx = (position.x - previous.x) as f32;
                        let dy = (position.y - previous.y) as f32;
                        self.rotate(dx, dy, camera)
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::Focused(false) => {
                self.is_mouse_pressed = false;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                        *y as f32 / PIXELS_PER_LINE
                    }
                };
                self.zoom(-lines * self.zoom_speed, camera)
            }
            WindowEvent::PinchGesture { delta, .. } => self.zoom(-*delta as f32, camera),
            _ => false,
        }
    }

    fn rotate(&self, dx: f32, dy: f32, camera: &mut OrbitCamera) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        camera.add_yaw(-dx * self.rotate_speed);
        camera.add_pitch(dy * self.rotate_speed);
        true
    }

    fn zoom(&self, delta: f32, camera: &mut OrbitCamera) -> bool {
        if !self.enable_zoom || delta == 0.0 {
            return false;
        }
        camera.add_distance(delta);
        true
    }
}
