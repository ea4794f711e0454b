use glam::{Mat4, Vec3};
use shared::PartId;

use super::mesh::MeshData;
use super::model::PartMesh;

/// A ray in world space
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// The same ray expressed in another frame. `matrix` must be rigid
    /// (rotation + translation) so hit distances stay comparable.
    pub fn transformed(&self, matrix: Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction).normalize_or_zero(),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_mesh(data: &MeshData) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for i in 0..data.vertex_count() {
            let p = data.position(i);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Nearest triangle hit distance in a mesh
pub fn nearest_hit(ray: &Ray, mesh: &MeshData) -> Option<f32> {
    (0..mesh.triangle_count())
        .filter_map(|tri| {
            let [v0, v1, v2] = mesh.triangle(tri);
            ray_triangle_intersect(ray, v0, v1, v2)
        })
        .min_by(f32::total_cmp)
}

/// One part under the pointer
#[derive(Clone, Debug, PartialEq)]
pub struct PartHit {
    pub part: PartId,
    pub distance: f32,
}

/// Every part the ray crosses, nearest first, one entry per part.
pub fn pick_parts(ray: &Ray, parts: &[PartMesh]) -> Vec<PartHit> {
    let mut hits: Vec<PartHit> = parts
        .iter()
        .filter(|p| ray_aabb(ray, &p.bounds).is_some())
        .filter_map(|p| {
            nearest_hit(ray, &p.mesh).map(|distance| PartHit {
                part: p.part.clone(),
                distance,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::mesh::cube;

    fn part(name: &str, mesh: MeshData) -> PartMesh {
        PartMesh::new(PartId::new(name), mesh)
    }

    fn ray_down_z() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        }
    }

    #[test]
    fn test_triangle_hit_distance() {
        let d = ray_triangle_intersect(
            &ray_down_z(),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!((d.unwrap() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_behind_origin_missed() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, -10.0),
            direction: Vec3::NEG_Z,
        };
        let d = ray_triangle_intersect(
            &ray,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(d.is_none());
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_mesh(&cube(2.0, 2.0, 2.0));
        assert!((ray_aabb(&ray_down_z(), &aabb).unwrap() - 9.0).abs() < 1e-5);
        assert_eq!(aabb.center(), Vec3::ZERO);
    }

    #[test]
    fn test_pick_parts_orders_nearest_first() {
        let far = cube(1.0, 1.0, 1.0).transformed(Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)));
        let near = cube(1.0, 1.0, 1.0).transformed(Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)));
        let middle = cube(1.0, 1.0, 1.0);
        let parts = vec![part("far", far), part("near", near), part("middle", middle)];

        let hits = pick_parts(&ray_down_z(), &parts);
        let order: Vec<&str> = hits.iter().map(|h| h.part.as_str()).collect();
        assert_eq!(order, ["near", "middle", "far"]);
        assert!((hits[0].distance - 6.5).abs() < 1e-4);
    }

    #[test]
    fn test_pick_parts_miss_is_empty() {
        let parts = vec![part("a", cube(1.0, 1.0, 1.0))];
        let ray = Ray {
            origin: Vec3::new(5.0, 5.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert!(pick_parts(&ray, &parts).is_empty());
    }

    #[test]
    fn test_ray_transformed_by_rigid_matrix() {
        let m = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let r = ray_down_z().transformed(m);
        assert_eq!(r.origin, Vec3::new(1.0, 0.0, 10.0));
        assert_eq!(r.direction, Vec3::NEG_Z);
    }
}
