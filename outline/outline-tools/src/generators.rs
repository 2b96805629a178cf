//! Procedural meshes with split seams, used by the debug tools and tests.

use std::f32::consts::PI;

use crate::geometry::{add, scale, Vec3};
use crate::mesh::MeshData;

/// Axis-aligned cube with hard edges: 4 vertices per face (24 total), flat face normals.
/// Every corner position is shared by three vertices from different faces.
pub fn hard_edged_cube(half_extent: f32) -> MeshData {
    // (normal, u, v) with u x v == normal so the quads wind counter-clockwise from outside.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let h = half_extent;
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let base = positions.len() as u32;
        let center = scale(normal, h);
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push(add(center, add(scale(u, su * h), scale(v, sv * h))));
            normals.push(normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData {
        positions,
        normals,
        indices,
        ..Default::default()
    }
}

/// UV sphere with a duplicated longitude seam and one vertex per slice at each pole.
/// `stacks` and `slices` are clamped to at least 3.
pub fn uv_sphere(radius: f32, stacks: u32, slices: u32) -> MeshData {
    let stacks = stacks.max(3);
    let slices = slices.max(3);
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=stacks {
        // Poles and the seam column are placed exactly so duplicates coincide bit for bit.
        let (sin_t, cos_t) = match i {
            0 => (0.0, 1.0),
            i if i == stacks => (0.0, -1.0),
            i => (i as f32 / stacks as f32 * PI).sin_cos(),
        };
        for j in 0..=slices {
            let (sin_p, cos_p) = if j == slices {
                (0.0, 1.0)
            } else {
                (j as f32 / slices as f32 * PI * 2.0).sin_cos()
            };
            let n = [sin_t * cos_p, cos_t, sin_t * sin_p];
            positions.push(scale(n, radius));
            normals.push(n);
        }
    }

    let stride = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * stride + j;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, c]);
            indices.extend_from_slice(&[b, d, c]);
        }
    }

    MeshData {
        positions,
        normals,
        indices,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{dot, face_normal};
    use crate::smooth::validate_topology;

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = hard_edged_cube(0.5);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        validate_topology(mesh.vertex_count(), &mesh.indices).unwrap();
        for t in 0..mesh.triangle_count() {
            let tri = mesh.triangle(t).unwrap();
            let [a, b, c] = tri.map(|i| mesh.positions[i as usize]);
            let n = face_normal(a, b, c, 1e-6).unwrap();
            assert!(dot(n, mesh.normals[tri[0] as usize]) > 0.999);
        }
    }

    #[test]
    fn sphere_triangles_wind_outward() {
        let mesh = uv_sphere(1.0, 6, 8);
        assert_eq!(mesh.vertex_count(), 7 * 9);
        validate_topology(mesh.vertex_count(), &mesh.indices).unwrap();
        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t).unwrap().map(|i| mesh.positions[i as usize]);
            // Pole triangles collapse to a line.
            if let Some(n) = face_normal(a, b, c, 1e-6) {
                let centroid = scale(add(add(a, b), c), 1.0 / 3.0);
                assert!(dot(n, centroid) > 0.0);
            }
        }
    }
}
