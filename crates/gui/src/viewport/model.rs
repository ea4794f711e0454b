//! Per-part preview geometry and the idle float animation.

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{ModelDescription, PartId};

use super::mesh::{shape_mesh, MeshData};
use super::picking::{pick_parts, Aabb, PartHit, Ray};

/// Triangles belonging to one part, in model space
#[derive(Clone, Debug)]
pub struct PartMesh {
    pub part: PartId,
    pub mesh: MeshData,
    pub bounds: Aabb,
}

impl PartMesh {
    pub fn new(part: PartId, mesh: MeshData) -> Self {
        let bounds = Aabb::from_mesh(&mesh);
        Self { part, mesh, bounds }
    }
}

/// Geometry for every part of a model
#[derive(Clone, Debug, Default)]
pub struct ModelMeshes {
    pub parts: Vec<PartMesh>,
}

impl ModelMeshes {
    pub fn build(model: &ModelDescription) -> Self {
        let parts = model
            .parts
            .iter()
            .filter(|spec| !spec.shapes.is_empty())
            .map(|spec| {
                let mut mesh = MeshData::default();
                for shape in &spec.shapes {
                    mesh.append(&shape_mesh(shape));
                }
                PartMesh::new(spec.name.clone(), mesh)
            })
            .collect();
        Self { parts }
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.triangle_count()).sum()
    }

    /// Parts crossed by a world-space ray with the model placed at `pose`
    pub fn pick(&self, world_ray: &Ray, pose: Mat4) -> Vec<PartHit> {
        pick_parts(&world_ray.transformed(pose.inverse()), &self.parts)
    }
}

/// Idle rocking of the whole model after `t` seconds.
///
/// Rigid: rotation plus a vertical lift, so picking can work in model space.
pub fn float_pose(t: f32) -> Mat4 {
    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        (t / 4.0).cos() / 8.0,
        (t / 4.0).sin() / 8.0,
        -0.2 - (1.0 + (t / 1.5).sin()) / 20.0,
    );
    let lift = (1.0 + (t / 1.5).sin()) / 10.0;
    Mat4::from_rotation_translation(rotation, Vec3::new(0.0, lift, 0.0))
}
