//! User interactions layered over input and camera.

pub mod focus;

pub use focus::{FocusOutcome, FocusResolver};
