//! Pointer input: double-activation detection, routing of window events into
//! it, and the listener registry the focus interaction subscribes to.

pub mod double_click;
pub mod pointer;
pub mod router;

pub use double_click::DoubleClickDetector;
pub use pointer::{ListenerGuard, PointerEvent, PointerListeners, ViewportRect};
pub use router::PointerRouter;
