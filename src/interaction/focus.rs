//! Double-click to focus: re-targets the orbit camera onto the clicked surface.

use std::rc::{Rc, Weak};

use cgmath::Vector3;

use crate::{
    gfx::{
        camera::FocusHandle,
        picking::{normalize_pointer, ObjectPicker},
        scene::Scene,
    },
    input::{ListenerGuard, PointerEvent, PointerListeners},
};

/// What a focus request did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusOutcome {
    /// The orbit target moved to this world point.
    Retargeted(Vector3<f32>),
    /// Nothing under the pointer; the camera is unchanged.
    Missed,
    /// Camera or scene no longer exist; nothing was done.
    Detached,
}

/// Resolves pointer double-activations into new orbit targets.
///
/// Holds only weak references, so a resolver that outlives the viewport
/// reports [`FocusOutcome::Detached`] instead of touching torn-down state.
#[derive(Clone)]
pub struct FocusResolver {
    camera: FocusHandle,
    scene: Weak<Scene>,
    picker: ObjectPicker,
}

impl FocusResolver {
    pub fn new(camera: FocusHandle, scene: &Rc<Scene>) -> Self {
        Self {
            camera,
            scene: Rc::downgrade(scene),
            picker: ObjectPicker::new(),
        }
    }

    /// Casts a ray through the event position and moves the target to the
    /// nearest hit, if any.
    pub fn resolve(&self, event: &PointerEvent) -> FocusOutcome {
        let Some(view) = self.camera.view() else {
            return FocusOutcome::Detached;
        };
        let Some(scene) = self.scene.upgrade() else {
            return FocusOutcome::Detached;
        };
        let Some(ndc) = normalize_pointer((event.x, event.y), &event.bounds) else {
            return FocusOutcome::Missed;
        };

        let ray = ObjectPicker::screen_to_ray(ndc, &view);
        let Some(hit) = self.picker.pick_nearest(&ray, &scene) else {
            return FocusOutcome::Missed;
        };

        if self.camera.set_target(hit.point) {
            log::info!(
                "Focus on '{}' at ({:.2}, {:.2}, {:.2})",
                hit.node_name,
                hit.point.x,
                hit.point.y,
                hit.point.z
            );
            FocusOutcome::Retargeted(hit.point)
        } else {
            FocusOutcome::Detached
        }
    }

    /// Subscribes to double-activations until the returned guard drops.
    pub fn attach(self, listeners: &PointerListeners) -> ListenerGuard {
        listeners.attach(move |event| {
            let outcome = self.resolve(event);
            log::debug!("Double-click at ({}, {}): {outcome:?}", event.x, event.y);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CameraOptions,
        gfx::{
            camera::{CameraController, CameraManager, OrbitCamera, SharedCamera},
            geometry::generate_cube,
            scene::{Mesh, NodeKind, SceneNode},
        },
        input::ViewportRect,
    };
    use cgmath::{InnerSpace, Matrix4};

    const RECT: ViewportRect = ViewportRect {
        left: 0.0,
        top: 0.0,
        width: 1200.0,
        height: 800.0,
    };

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    fn default_camera() -> SharedCamera {
        CameraManager::from_options(&CameraOptions::default(), 1.5).into_shared()
    }

    fn ground_scene() -> Rc<Scene> {
        let mut scene = Scene::new();
        scene.add_ground(200.0, [0.75, 1.0, 0.5, 1.0]);
        Rc::new(scene)
    }

    fn target(camera: &SharedCamera) -> Vector3<f32> {
        camera.borrow().camera.target
    }

    fn click(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(x, y, RECT)
    }

    #[test]
    fn center_click_on_ground_focuses_the_origin() {
        let camera = default_camera();
        let scene = ground_scene();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);

        let outcome = resolver.resolve(&click(600.0, 400.0));
        let FocusOutcome::Retargeted(point) = outcome else {
            panic!("expected a hit, got {outcome:?}");
        };
        assert!(approx(point, Vector3::new(0.0, 0.0, 0.0)));
        assert!(approx(target(&camera), Vector3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn off_center_click_recenters_the_view_on_the_hit() {
        let camera = default_camera();
        let eye = camera.borrow().camera.eye;
        let scene = ground_scene();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);

        let FocusOutcome::Retargeted(point) = resolver.resolve(&click(900.0, 600.0)) else {
            panic!("expected the ground to be hit");
        };
        assert!(point.y.abs() < 1e-4);
        assert!(point.x.abs() > 0.1 || point.z.abs() > 0.1);

        let view = camera.borrow().camera.view();
        assert!(approx(view.target, point));
        assert!(approx(view.eye, eye));

        let center = ObjectPicker::screen_to_ray((0.0, 0.0), &view);
        assert!(approx(center.direction, (point - eye).normalize()));
    }

    #[test]
    fn clicking_the_sky_changes_nothing() {
        let camera = CameraManager::new(
            OrbitCamera::looking_at(Vector3::new(0.0, 1.0, 10.0), Vector3::new(0.0, 1.0, 0.0), 1.5),
            CameraController::new(0.005, 0.1),
        )
        .into_shared();
        let before = camera.borrow().camera.view();
        let scene = ground_scene();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);

        assert_eq!(resolver.resolve(&click(600.0, 100.0)), FocusOutcome::Missed);
        assert_eq!(camera.borrow().camera.view(), before);
    }

    #[test]
    fn nearest_object_wins_over_the_ground_behind_it() {
        let mut scene = Scene::new();
        scene.add_ground(200.0, [0.75, 1.0, 0.5, 1.0]);
        let (vertices, indices) = generate_cube().to_scene_format();
        let cube = scene.add_mesh(Mesh::from_vertices(vertices, indices));
        scene.add_node(
            SceneNode::new("crate", NodeKind::Part)
                .with_mesh(cube)
                .with_transform(
                    Matrix4::from_translation(Vector3::new(0.3, 1.0, -0.2))
                        * Matrix4::from_scale(2.0),
                ),
        );

        let scene = Rc::new(scene);
        let camera = default_camera();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);

        let outcome = resolver.resolve(&click(600.0, 400.0));
        let FocusOutcome::Retargeted(point) = outcome else {
            panic!("expected the cube to be hit, got {outcome:?}");
        };
        assert!(approx(point, Vector3::new(0.8, 0.8, 0.8)));
        assert!(approx(target(&camera), point));
    }

    #[test]
    fn degenerate_viewport_is_a_miss() {
        let camera = default_camera();
        let scene = ground_scene();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);
        let event = PointerEvent::new(10.0, 10.0, ViewportRect::new(0.0, 0.0, 0.0, 800.0));
        assert_eq!(resolver.resolve(&event), FocusOutcome::Missed);
    }

    #[test]
    fn missing_camera_is_tolerated() {
        let scene = ground_scene();
        let resolver = FocusResolver::new(FocusHandle::detached(), &scene);
        assert_eq!(resolver.resolve(&click(600.0, 400.0)), FocusOutcome::Detached);

        let camera = default_camera();
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &scene);
        drop(camera);
        assert_eq!(resolver.resolve(&click(600.0, 400.0)), FocusOutcome::Detached);
    }

    #[test]
    fn dropped_scene_is_tolerated() {
        let camera = default_camera();
        // The scene is a temporary, gone once the resolver is built.
        let resolver = FocusResolver::new(FocusHandle::new(&camera), &ground_scene());
        assert_eq!(resolver.resolve(&click(900.0, 600.0)), FocusOutcome::Detached);
        assert_eq!(target(&camera), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn detached_listener_does_not_mutate() {
        let camera = default_camera();
        let scene = ground_scene();
        let listeners = PointerListeners::new();

        let guard = FocusResolver::new(FocusHandle::new(&camera), &scene).attach(&listeners);
        assert_eq!(listeners.dispatch(&click(900.0, 600.0)), 1);
        let moved = target(&camera);
        assert!(!approx(moved, Vector3::new(0.0, 0.0, 0.0)));

        drop(guard);
        assert_eq!(listeners.dispatch(&click(600.0, 400.0)), 0);
        assert_eq!(target(&camera), moved);
    }
}
