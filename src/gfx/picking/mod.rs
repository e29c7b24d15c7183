//! # Ray Picking
//!
//! Pointer-to-world resolution by ray casting against the scene graph.
//!
//! ## How it works
//!
//! 1. **Pointer to NDC**: pixel coordinates are normalized against the
//!    viewport rectangle to [-1, 1], with the vertical axis flipped.
//! 2. **NDC to Ray**: the point is unprojected through the camera's view and
//!    projection; the ray starts at the camera eye.
//! 3. **Ray-Scene Intersection**: every mesh-bearing node is tested, children
//!    included, first against its world-space bounding box and then per
//!    triangle.
//! 4. **Ordering**: hits are sorted by distance from the camera. The sort is
//!    stable, so equidistant hits keep depth-first traversal order.
//!
//! ## Usage
//!
//! ```no_run
//! use agentscape::gfx::picking::{normalize_pointer, ObjectPicker};
//! # fn demo(view: &agentscape::gfx::camera::CameraView, scene: &agentscape::gfx::scene::Scene,
//! #         rect: agentscape::input::ViewportRect) {
//! if let Some(ndc) = normalize_pointer((640.0, 400.0), &rect) {
//!     let ray = ObjectPicker::screen_to_ray(ndc, view);
//!     if let Some(hit) = ObjectPicker::new().pick_nearest(&ray, scene) {
//!         println!("hit {} at {:?}", hit.node_name, hit.point);
//!     }
//! }
//! # }
//! ```

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{
    gfx::{camera::CameraView, scene::Scene},
    input::ViewportRect,
};

/// Rejects near-parallel ray/triangle pairs.
const TRIANGLE_EPSILON: f32 = 1e-7;

/// Barycentric slack so rays through a shared edge hit at least one side.
const EDGE_EPSILON: f32 = 1e-6;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore intersection, accepting both faces.
    ///
    /// Returns the distance along the ray, or `None` for misses and hits behind
    /// the origin.
    pub fn intersect_triangle(&self, a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < TRIANGLE_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(-EDGE_EPSILON..=1.0 + EDGE_EPSILON).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > TRIANGLE_EPSILON).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices. An empty set gives a degenerate box at the origin.
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    /// Slab test. Returns the entry distance (or exit distance when the origin
    /// is inside), or `None` if the ray misses.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if direction.abs() < f32::EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let (t0, t1) = {
                let a = (lo - origin) * inv;
                let b = (hi - origin) * inv;
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.min.y, self.min.z],
            [self.min.x, self.max.y, self.min.z],
            [self.min.x, self.min.y, self.max.z],
            [self.max.x, self.max.y, self.min.z],
            [self.max.x, self.min.y, self.max.z],
            [self.min.x, self.max.y, self.max.z],
            [self.max.x, self.max.y, self.max.z],
        ];

        let transformed: Vec<[f32; 3]> = corners
            .iter()
            .map(|&corner| transform_point(matrix, Vector3::from(corner)).into())
            .collect();

        Self::from_vertices(&transformed)
    }
}

/// Transforms a point by an affine or projective matrix, dividing by w.
pub fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let p = matrix * point.extend(1.0);
    if p.w.abs() > f32::EPSILON && p.w != 1.0 {
        p.truncate() / p.w
    } else {
        p.truncate()
    }
}

/// Converts pixel coordinates into normalized device coordinates.
///
/// x grows to the right and y grows upward in the result, both in [-1, 1]
/// for points inside `rect`. Returns `None` for an empty rectangle.
pub fn normalize_pointer(pixel: (f32, f32), rect: &ViewportRect) -> Option<(f32, f32)> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let ndc_x = ((pixel.0 - rect.left) / rect.width) * 2.0 - 1.0;
    let ndc_y = -((pixel.1 - rect.top) / rect.height) * 2.0 + 1.0;
    Some((ndc_x, ndc_y))
}

/// One ray/mesh intersection
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Distance from the ray origin
    pub distance: f32,
    /// World space intersection point
    pub point: Vector3<f32>,
    /// Name of the node whose mesh was hit
    pub node_name: String,
    /// Depth-first index of that node among visited nodes
    pub node_order: usize,
    /// Index of the hit triangle within the mesh
    pub triangle: usize,
}

/// Ray caster over the scene graph
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectPicker;

impl ObjectPicker {
    pub fn new() -> Self {
        Self
    }

    /// Builds the world-space ray from the camera eye through an NDC point.
    pub fn screen_to_ray(ndc: (f32, f32), view: &CameraView) -> Ray {
        let view_proj = view.projection_matrix() * view.view_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);

        // Any point on the far plane lies on the pixel's line of sight
        let far = inv_view_proj * Vector4::new(ndc.0, ndc.1, 1.0, 1.0);
        let far = far.truncate() / far.w;

        Ray::new(view.eye, far - view.eye)
    }

    /// Every intersection of `ray` with the scene, nearest first.
    ///
    /// Equidistant hits keep depth-first traversal order.
    pub fn intersect_scene(&self, ray: &Ray, scene: &Scene) -> Vec<Intersection> {
        let mut hits = Vec::new();
        let mut order = 0usize;

        scene.visit(|node, world| {
            let node_order = order;
            order += 1;

            let Some(mesh) = node.mesh.and_then(|id| scene.mesh(id)) else {
                return;
            };
            if mesh.bounds().transform(&world).intersect_ray(ray).is_none() {
                return;
            }

            // Nearest triangle of this mesh
            let mut nearest: Option<(f32, usize)> = None;
            for (triangle, [a, b, c]) in mesh.triangles().enumerate() {
                let a = transform_point(&world, a.into());
                let b = transform_point(&world, b.into());
                let c = transform_point(&world, c.into());
                if let Some(t) = ray.intersect_triangle(a, b, c) {
                    if nearest.map_or(true, |(best, _)| t < best) {
                        nearest = Some((t, triangle));
                    }
                }
            }

            if let Some((distance, triangle)) = nearest {
                hits.push(Intersection {
                    distance,
                    point: ray.point_at(distance),
                    node_name: node.name.clone(),
                    node_order,
                    triangle,
                });
            }
        });

        // Stable sort keeps traversal order for ties
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// The nearest intersection, if any.
    pub fn pick_nearest(&self, ray: &Ray, scene: &Scene) -> Option<Intersection> {
        self.intersect_scene(ray, scene).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::generate_cube,
        scene::{
            mesh::Mesh,
            node::{NodeKind, SceneNode},
        },
    };
    use cgmath::{Deg, Rad};

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    fn view_from(eye: Vector3<f32>, target: Vector3<f32>) -> CameraView {
        CameraView {
            eye,
            target,
            up: Vector3::unit_y(),
            fovy: Rad::from(Deg(60.0)),
            aspect: 1.5,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    fn cube_scene(children: &[(&str, Vector3<f32>)]) -> Scene {
        let mut scene = Scene::new();
        let (vertices, indices) = generate_cube().to_scene_format();
        let cube = scene.add_mesh(Mesh::from_vertices(vertices, indices));
        let mut group = SceneNode::new("group", NodeKind::Part);
        for (name, offset) in children {
            group.add_child(
                SceneNode::new(*name, NodeKind::Part)
                    .with_mesh(cube)
                    .with_transform(Matrix4::from_translation(*offset)),
            );
        }
        scene.add_node(group);
        scene
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());

        let behind = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&behind).is_none());
    }

    #[test]
    fn flat_box_is_hit_from_above() {
        let ground = AABB::new(Vector3::new(-100.0, 0.0, -100.0), Vector3::new(100.0, 0.0, 100.0));
        let ray = Ray::new(Vector3::new(5.0, 5.0, 5.0), Vector3::new(-1.0, -1.0, -1.0));
        let t = ground.intersect_ray(&ray).unwrap();
        assert!(approx(ray.point_at(t), Vector3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn triangle_hits_both_faces_and_rejects_behind() {
        let (a, b, c) = (
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, -1.0),
        );
        let down = Ray::new(Vector3::new(0.0, 2.0, 0.0), -Vector3::unit_y());
        let up = Ray::new(Vector3::new(0.0, -3.0, 0.0), Vector3::unit_y());
        let away = Ray::new(Vector3::new(0.0, 2.0, 0.0), Vector3::unit_y());
        let beside = Ray::new(Vector3::new(5.0, 2.0, 0.0), -Vector3::unit_y());

        assert!((down.intersect_triangle(a, b, c).unwrap() - 2.0).abs() < 1e-6);
        assert!((up.intersect_triangle(a, b, c).unwrap() - 3.0).abs() < 1e-6);
        assert!(away.intersect_triangle(a, b, c).is_none());
        assert!(beside.intersect_triangle(a, b, c).is_none());
    }

    #[test]
    fn normalization_flips_vertical_axis() {
        let rect = ViewportRect::new(0.0, 0.0, 800.0, 600.0);
        assert_eq!(normalize_pointer((400.0, 300.0), &rect), Some((0.0, 0.0)));
        assert_eq!(normalize_pointer((0.0, 0.0), &rect), Some((-1.0, 1.0)));
        assert_eq!(normalize_pointer((800.0, 600.0), &rect), Some((1.0, -1.0)));
    }

    #[test]
    fn normalization_respects_rect_offset() {
        let rect = ViewportRect::new(100.0, 50.0, 200.0, 100.0);
        assert_eq!(normalize_pointer((200.0, 100.0), &rect), Some((0.0, 0.0)));
        assert_eq!(normalize_pointer((150.0, 75.0), &rect), Some((-0.5, 0.5)));
        assert!(normalize_pointer((1.0, 1.0), &ViewportRect::new(0.0, 0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn center_pixel_gives_the_forward_ray() {
        let view = view_from(Vector3::new(5.0, 5.0, 5.0), Vector3::new(0.0, 0.0, 0.0));
        let ray = ObjectPicker::screen_to_ray((0.0, 0.0), &view);
        assert!(approx(ray.origin, view.eye));
        assert!(approx(ray.direction, view.forward()));
    }

    #[test]
    fn symmetric_pixels_give_symmetric_rays() {
        let view = view_from(Vector3::new(5.0, 5.0, 5.0), Vector3::new(0.0, 0.0, 0.0));
        let rect = ViewportRect::new(0.0, 0.0, 1200.0, 800.0);
        let forward = view.forward();

        for (dx, dy) in [(150.0, 0.0), (0.0, 90.0), (310.0, -220.0)] {
            let a = normalize_pointer((600.0 + dx, 400.0 + dy), &rect).unwrap();
            let b = normalize_pointer((600.0 - dx, 400.0 - dy), &rect).unwrap();
            let ra = ObjectPicker::screen_to_ray(a, &view);
            let rb = ObjectPicker::screen_to_ray(b, &view);

            // Same angle to the forward axis, and the pair averages onto it
            assert!((ra.direction.dot(forward) - rb.direction.dot(forward)).abs() < 1e-5);
            let mid = (ra.direction + rb.direction).normalize();
            assert!(approx(mid, forward));
        }
    }

    #[test]
    fn nested_children_are_hit_nearest_first() {
        let scene = cube_scene(&[
            ("far", Vector3::new(0.0, 0.0, -10.0)),
            ("near", Vector3::new(0.0, 0.0, -5.0)),
        ]);
        let ray = Ray::new(Vector3::new(0.1, 0.2, 0.0), -Vector3::unit_z());

        let hits = ObjectPicker::new().intersect_scene(&ray, &scene);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node_name, "near");
        assert!((hits[0].distance - 4.5).abs() < 1e-5);
        assert!(approx(hits[0].point, Vector3::new(0.1, 0.2, -4.5)));
        assert_eq!(hits[1].node_name, "far");
    }

    #[test]
    fn equidistant_hits_keep_traversal_order() {
        let scene = cube_scene(&[
            ("first", Vector3::new(0.0, 0.0, -5.0)),
            ("second", Vector3::new(0.0, 0.0, -5.0)),
        ]);
        let ray = Ray::new(Vector3::new(0.1, 0.2, 0.0), -Vector3::unit_z());

        let hits = ObjectPicker::new().intersect_scene(&ray, &scene);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].distance, hits[1].distance);
        assert_eq!(hits[0].node_name, "first");
        assert!(hits[0].node_order < hits[1].node_order);
    }

    #[test]
    fn invisible_nodes_are_not_hit() {
        let mut scene = cube_scene(&[("hidden", Vector3::new(0.0, 0.0, -5.0))]);
        scene.roots[0].visible = false;
        let ray = Ray::new(Vector3::new(0.1, 0.2, 0.0), -Vector3::unit_z());
        assert!(ObjectPicker::new().pick_nearest(&ray, &scene).is_none());
    }
}
