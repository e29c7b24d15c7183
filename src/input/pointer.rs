use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

/// Bounding rectangle of the render surface, in the same pixel space as
/// pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle of a whole window surface of the given size.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A double-activation at pixel `(x, y)` within `bounds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub bounds: ViewportRect,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, bounds: ViewportRect) -> Self {
        Self { x, y, bounds }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&PointerEvent)>>;

struct Listener {
    id: u64,
    active: Rc<Cell<bool>>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Registry of double-activation handlers.
///
/// Handlers stay registered exactly as long as the [`ListenerGuard`] returned
/// by [`PointerListeners::attach`] is alive.
#[derive(Clone, Default)]
pub struct PointerListeners {
    registry: Rc<RefCell<Registry>>,
}

impl PointerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, handler: impl FnMut(&PointerEvent) + 'static) -> ListenerGuard {
        let active = Rc::new(Cell::new(true));
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Listener {
            id,
            active: active.clone(),
            handler: Rc::new(RefCell::new(handler)),
        });
        log::debug!("Pointer listener {id} attached");

        ListenerGuard {
            id,
            active,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Calls every live handler with `event`. Returns how many ran.
    ///
    /// Handlers may attach or detach listeners while running; a listener
    /// detached mid-dispatch is skipped for the rest of it.
    pub fn dispatch(&self, event: &PointerEvent) -> usize {
        let snapshot: Vec<(Rc<Cell<bool>>, Handler)> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|l| (l.active.clone(), l.handler.clone()))
            .collect();

        let mut ran = 0;
        for (active, handler) in snapshot {
            if !active.get() {
                continue;
            }
            // A handler re-entering dispatch does not run itself again.
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (&mut *handler)(event);
                ran += 1;
            }
        }

        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.listeners.retain(|l| l.active.get());
        }
        ran
    }

    /// Number of attached listeners.
    pub fn len(&self) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.active.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps one handler registered; dropping it detaches the handler.
#[must_use = "dropping the guard detaches the listener immediately"]
pub struct ListenerGuard {
    id: u64,
    active: Rc<Cell<bool>>,
    registry: Weak<RefCell<Registry>>,
}

impl ListenerGuard {
    pub fn is_attached(&self) -> bool {
        self.active.get() && self.registry.strong_count() > 0
    }

    /// Detaches now. Same as dropping the guard.
    pub fn detach(self) {}
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.set(false);
        if let Some(registry) = self.registry.upgrade() {
            // Busy during dispatch: the listener is pruned when dispatch ends.
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.listeners.retain(|l| l.id != self.id);
            }
        }
        log::debug!("Pointer listener {} detached", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> PointerEvent {
        PointerEvent::new(10.0, 20.0, ViewportRect::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn attached_handlers_receive_events() {
        let listeners = PointerListeners::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _guard = listeners.attach(move |e| sink.borrow_mut().push((e.x, e.y)));

        assert_eq!(listeners.dispatch(&event()), 1);
        assert_eq!(*seen.borrow(), vec![(10.0, 20.0)]);
    }

    #[test]
    fn dropping_the_guard_detaches() {
        let listeners = PointerListeners::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let guard = listeners.attach(move |_| counter.set(counter.get() + 1));
        assert!(guard.is_attached());
        assert_eq!(listeners.len(), 1);

        drop(guard);
        assert!(listeners.is_empty());
        assert_eq!(listeners.dispatch(&event()), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn guard_outliving_the_registry_is_harmless() {
        let listeners = PointerListeners::new();
        let guard = listeners.attach(|_| {});
        drop(listeners);
        assert!(!guard.is_attached());
        guard.detach();
    }

    #[test]
    fn handler_detaching_another_mid_dispatch() {
        let listeners = PointerListeners::new();
        let calls = Rc::new(Cell::new(0));

        let victim: Rc<RefCell<Option<ListenerGuard>>> = Rc::new(RefCell::new(None));
        let slot = victim.clone();
        let _killer = listeners.attach(move |_| {
            slot.borrow_mut().take();
        });
        let counter = calls.clone();
        *victim.borrow_mut() = Some(listeners.attach(move |_| counter.set(counter.get() + 1)));

        assert_eq!(listeners.dispatch(&event()), 1);
        assert_eq!(calls.get(), 0);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn degenerate_rects() {
        assert!(ViewportRect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(!ViewportRect::from_size(800, 600).is_degenerate());
    }
}
