use std::time::Instant;

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent},
};

use super::{DoubleClickDetector, PointerEvent, PointerListeners, ViewportRect};

/// Turns raw window events into double-activations for the listeners.
///
/// Left mouse presses and touch starts count as presses. Motion with the
/// button held, or a moving touch, cancels a pending first press once it
/// leaves the slop radius. Other buttons are ignored.
#[derive(Default)]
pub struct PointerRouter {
    listeners: PointerListeners,
    detector: DoubleClickDetector,
    cursor: Option<(f32, f32)>,
    left_held: bool,
}

impl PointerRouter {
    pub fn new(detector: DoubleClickDetector) -> Self {
        Self {
            detector,
            ..Self::default()
        }
    }

    /// Registry double-activations are dispatched to.
    pub fn listeners(&self) -> &PointerListeners {
        &self.listeners
    }

    /// Routes one window event using the current time.
    ///
    /// Returns true if a double-activation was dispatched.
    pub fn handle_event(&mut self, event: &WindowEvent, bounds: ViewportRect) -> bool {
        self.handle_event_at(event, Instant::now(), bounds)
    }

    /// Routes one window event that happened at `now`.
    pub fn handle_event_at(
        &mut self,
        event: &WindowEvent,
        now: Instant,
        bounds: ViewportRect,
    ) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let position = to_pair(*position);
                self.cursor = Some(position);
                if self.left_held {
                    self.detector.track_drag(position);
                }
                false
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.left_held = *state == ElementState::Pressed;
                match (self.left_held, self.cursor) {
                    (true, Some(cursor)) => self.press(now, cursor, bounds),
                    _ => false,
                }
            }
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => match phase {
                TouchPhase::Started => self.press(now, to_pair(*location), bounds),
                TouchPhase::Moved => {
                    self.detector.track_drag(to_pair(*location));
                    false
                }
                TouchPhase::Ended | TouchPhase::Cancelled => false,
            },
            WindowEvent::Focused(false) => {
                self.left_held = false;
                self.detector.reset();
                false
            }
            _ => false,
        }
    }

    fn press(&mut self, now: Instant, (x, y): (f32, f32), bounds: ViewportRect) -> bool {
        if !self.detector.press(now, (x, y)) {
            return false;
        }
        let ran = self.listeners.dispatch(&PointerEvent::new(x, y, bounds));
        log::debug!("Double-activation at ({x}, {y}) reached {ran} listener(s)");
        true
    }
}

fn to_pair(position: PhysicalPosition<f64>) -> (f32, f32) {
    (position.x as f32, position.y as f32)
}
