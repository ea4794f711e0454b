use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use shared::{Primitive, Shape, Transform};

/// Floats per vertex: position(3) + normal(3)
pub const STRIDE: usize = 6;

const SEGMENTS: u32 = 24;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z]
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * STRIDE;
        Vec3::new(
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        )
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * STRIDE;
        Vec3::new(
            self.vertices[base + 3],
            self.vertices[base + 4],
            self.vertices[base + 5],
        )
    }

    /// Corner positions of a triangle
    pub fn triangle(&self, tri: usize) -> [Vec3; 3] {
        [
            self.position(self.indices[tri * 3] as usize),
            self.position(self.indices[tri * 3 + 1] as usize),
            self.position(self.indices[tri * 3 + 2] as usize),
        ]
    }

    /// Append another mesh, re-basing its indices
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Transform positions by `matrix` and normals by its normal matrix
    pub fn transformed(&self, matrix: Mat4) -> MeshData {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for i in 0..self.vertex_count() {
            let p = matrix.transform_point3(self.position(i));
            let n = (normal_matrix * self.normal(i)).normalize_or_zero();
            vertices.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
        }
        MeshData {
            vertices,
            indices: self.indices.clone(),
        }
    }
}

/// Model matrix for a shape transform (scale, then XYZ rotation, then translation)
pub fn transform_matrix(t: &Transform) -> Mat4 {
    let v = |a: [f64; 3]| Vec3::new(a[0] as f32, a[1] as f32, a[2] as f32);
    let r = v(t.rotation);
    Mat4::from_scale_rotation_translation(
        v(t.scale),
        Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
        v(t.position),
    )
}

/// Triangulate a placed shape
pub fn shape_mesh(shape: &Shape) -> MeshData {
    let local = match shape.primitive {
        Primitive::Cube {
            width,
            height,
            depth,
        } => cube(width as f32, height as f32, depth as f32),
        Primitive::Cylinder { radius, height } => cylinder(radius as f32, height as f32, SEGMENTS),
        Primitive::Sphere { radius } => sphere(radius as f32, SEGMENTS / 2, SEGMENTS),
    };
    local.transformed(transform_matrix(&shape.transform))
}

// ── Primitive generation ─────────────────────────────────────

pub fn cube(w: f32, h: f32, d: f32) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(24 * STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, *v, *normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// Cylinder along the Y axis, centered on the origin
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let hh = height * 0.5;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..segments {
        let a0 = (i as f32) * std::f32::consts::TAU / segments as f32;
        let a1 = ((i + 1) as f32) * std::f32::consts::TAU / segments as f32;

        let n0 = Vec3::new(a0.cos(), 0.0, a0.sin());
        let n1 = Vec3::new(a1.cos(), 0.0, a1.sin());

        let base = (vertices.len() / STRIDE) as u32;
        push_vert(&mut vertices, Vec3::new(radius * n0.x, -hh, radius * n0.z), n0);
        push_vert(&mut vertices, Vec3::new(radius * n1.x, -hh, radius * n1.z), n1);
        push_vert(&mut vertices, Vec3::new(radius * n1.x, hh, radius * n1.z), n1);
        push_vert(&mut vertices, Vec3::new(radius * n0.x, hh, radius * n0.z), n0);

        indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }

    add_cap(&mut vertices, &mut indices, radius, hh, segments, false);
    add_cap(&mut vertices, &mut indices, radius, -hh, segments, true);

    MeshData { vertices, indices }
}

pub fn sphere(radius: f32, rings: u32, sectors: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for r in 0..=rings {
        let phi = std::f32::consts::PI * r as f32 / rings as f32;
        for s in 0..=sectors {
            let theta = std::f32::consts::TAU * s as f32 / sectors as f32;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            push_vert(&mut vertices, n * radius, n);
        }
    }

    for r in 0..rings {
        for s in 0..sectors {
            let i0 = r * (sectors + 1) + s;
            let i1 = i0 + 1;
            let i2 = i0 + sectors + 1;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
        }
    }

    MeshData { vertices, indices }
}

// ── Helpers ──────────────────────────────────────────────────

fn push_vert(v: &mut Vec<f32>, p: Vec3, n: Vec3) {
    v.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
}

fn add_cap(
    vertices: &mut Vec<f32>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    segments: u32,
    bottom: bool,
) {
    let normal = if bottom { Vec3::NEG_Y } else { Vec3::Y };
    let center_idx = (vertices.len() / STRIDE) as u32;
    push_vert(vertices, Vec3::new(0.0, y, 0.0), normal);

    for i in 0..segments {
        let angle = (i as f32) * std::f32::consts::TAU / segments as f32;
        push_vert(vertices, Vec3::new(radius * angle.cos(), y, radius * angle.sin()), normal);
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        if bottom {
            indices.extend_from_slice(&[center_idx, center_idx + 1 + i, center_idx + 1 + next]);
        } else {
            indices.extend_from_slice(&[center_idx, center_idx + 1 + next, center_idx + 1 + i]);
        }
    }
}
