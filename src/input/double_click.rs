use std::time::{Duration, Instant};

use crate::config::InputOptions;

const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_SLOP: f32 = 6.0;

/// Turns a stream of presses into double-activations.
///
/// Two presses within the time threshold and the slop radius of each other
/// form one double-activation. A third press starts a new sequence.
#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    threshold: Duration,
    slop: f32,
    pending: Option<(Instant, (f32, f32))>,
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_THRESHOLD, DOUBLE_CLICK_SLOP)
    }
}

impl DoubleClickDetector {
    pub fn new(threshold: Duration, slop: f32) -> Self {
        Self {
            threshold,
            slop,
            pending: None,
        }
    }

    pub fn from_options(options: &InputOptions) -> Self {
        Self::new(
            Duration::from_millis(options.double_click_ms),
            options.double_click_slop,
        )
    }

    /// Records a press at `position`; true if it completes a double-activation.
    pub fn press(&mut self, at: Instant, position: (f32, f32)) -> bool {
        match self.pending.take() {
            Some((first_at, first_pos))
                if at.saturating_duration_since(first_at) <= self.threshold
                    && self.within_slop(first_pos, position) =>
            {
                true
            }
            _ => {
                self.pending = Some((at, position));
                false
            }
        }
    }

    /// Forgets a pending first press if the pointer wandered past the slop.
    ///
    /// Call on pointer motion while a button is held, so a drag is never
    /// taken for a double-click.
    pub fn track_drag(&mut self, position: (f32, f32)) {
        if let Some((_, first_pos)) = self.pending {
            if !self.within_slop(first_pos, position) {
                self.reset();
            }
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    fn within_slop(&self, a: (f32, f32), b: (f32, f32)) -> bool {
        let (dx, dy) = (a.0 - b.0, a.1 - b.1);
        dx * dx + dy * dy <= self.slop * self.slop
    }
}
