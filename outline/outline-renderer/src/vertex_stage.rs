//! CPU mirror of the outline vertex/fragment stages (`shaders/outline.wgsl`).
//!
//! Same math as the shader, for host-side bounds/picking and for tests. Matrices are
//! column-major `[f32; 16]`, index `[col * 4 + row]`.

use bytemuck::{Pod, Zeroable};
use render_api::OutlineMaterial;

/// Uniform block bound at `@group(0) @binding(2)` of the outline shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OutlineUniforms {
    pub color: [f32; 4],
    pub thickness: f32,
    pub depth_offset: f32,
    pub depth_sign: f32,
    pub _pad: f32,
}

impl OutlineUniforms {
    /// Sanitize a material: thickness >= 0, depth offset in [0, 1], non-finite values fall back
    /// to the material defaults.
    pub fn from_material(material: &OutlineMaterial, reversed_z: bool) -> Self {
        let defaults = OutlineMaterial::default();
        let thickness = if material.thickness.is_finite() {
            material.thickness.max(0.0)
        } else {
            defaults.thickness
        };
        let depth_offset = if material.depth_offset.is_finite() {
            material.depth_offset.clamp(0.0, 1.0)
        } else {
            defaults.depth_offset
        };
        Self {
            color: material.color,
            thickness,
            depth_offset,
            depth_sign: depth_sign(reversed_z),
            _pad: 0.0,
        }
    }
}

/// Direction of "away from the camera" along clip-space z.
pub fn depth_sign(reversed_z: bool) -> f32 {
    if reversed_z {
        -1.0
    } else {
        1.0
    }
}

/// One vertex as seen by the outline vertex stage.
#[derive(Clone, Copy, Debug)]
pub struct VertexInput {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Present only when the mesh was drawn with precomputed smoothed normals.
    pub smoothed_normal: Option<[f32; 3]>,
}

pub fn extrude(position: [f32; 3], normal: [f32; 3], thickness: f32) -> [f32; 3] {
    [
        position[0] + normal[0] * thickness,
        position[1] + normal[1] * thickness,
        position[2] + normal[2] * thickness,
    ]
}

/// `a * b` for column-major 4x4 matrices.
pub fn mul_mat4(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

/// `m * vec4(p, 1)`.
pub fn transform_point(m: &[f32; 16], p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
    }
    out
}

/// Push clip-space z by `depth_offset` NDC units in the `depth_sign` direction.
pub fn apply_depth_bias(clip: [f32; 4], depth_offset: f32, depth_sign: f32) -> [f32; 4] {
    [clip[0], clip[1], clip[2] + depth_sign * depth_offset * clip[3], clip[3]]
}

/// Clip-space position of an outline vertex.
pub fn outline_vertex(
    input: &VertexInput,
    view_proj: &[f32; 16],
    model: &[f32; 16],
    uniforms: &OutlineUniforms,
) -> [f32; 4] {
    let normal = input.smoothed_normal.unwrap_or(input.normal);
    let extruded = extrude(input.position, normal, uniforms.thickness);
    let clip = transform_point(&mul_mat4(view_proj, model), extruded);
    apply_depth_bias(clip, uniforms.depth_offset, uniforms.depth_sign)
}

/// Fragment color: the flat outline color, no lighting or texturing.
pub fn outline_fragment(uniforms: &OutlineUniforms) -> [f32; 4] {
    uniforms.color
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_api::IDENTITY;

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
        // Right-handed, depth 0..1.
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = far / (near - far);
        [
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, range, -1.0,
            0.0, 0.0, range * near, 0.0,
        ]
    }

    fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
        let mut m = IDENTITY;
        m[12] = x;
        m[13] = y;
        m[14] = z;
        m
    }

    fn uniforms(thickness: f32, depth_offset: f32, reversed_z: bool) -> OutlineUniforms {
        OutlineUniforms::from_material(
            &OutlineMaterial {
                thickness,
                depth_offset,
                ..Default::default()
            },
            reversed_z,
        )
    }

    const INPUT: VertexInput = VertexInput {
        position: [0.25, -0.5, 0.75],
        normal: [0.0, 0.0, 1.0],
        smoothed_normal: None,
    };

    #[test]
    fn zero_thickness_keeps_position() {
        let u = uniforms(0.0, 0.0, false);
        assert_eq!(extrude(INPUT.position, INPUT.normal, u.thickness), INPUT.position);
        let vp = perspective(1.0, 1.5, 0.1, 100.0);
        let model = translation(0.0, 0.0, -5.0);
        let expected = transform_point(&mul_mat4(&vp, &model), INPUT.position);
        assert_eq!(outline_vertex(&INPUT, &vp, &model, &u), expected);
    }

    #[test]
    fn zero_depth_offset_leaves_z() {
        let vp = perspective(1.0, 1.0, 0.1, 100.0);
        let model = translation(0.0, 0.0, -5.0);
        for reversed in [false, true] {
            let u = uniforms(0.1, 0.0, reversed);
            let extruded = extrude(INPUT.position, INPUT.normal, 0.1);
            let unbiased = transform_point(&mul_mat4(&vp, &model), extruded);
            let clip = outline_vertex(&INPUT, &vp, &model, &u);
            assert_eq!(clip[2], unbiased[2]);
        }
    }

    #[test]
    fn depth_bias_pushes_away_in_both_conventions() {
        let clip = [0.1, 0.2, 2.0, 4.0];
        let standard = apply_depth_bias(clip, 0.25, depth_sign(false));
        let reversed = apply_depth_bias(clip, 0.25, depth_sign(true));
        assert!((standard[2] / standard[3] - 0.75).abs() < 1e-6);
        assert!((reversed[2] / reversed[3] - 0.25).abs() < 1e-6);
        assert_eq!(standard[3], clip[3]);
    }

    #[test]
    fn thickness_extrudes_along_selected_normal() {
        let u = uniforms(2.0, 0.0, false);
        let raw = outline_vertex(&INPUT, &IDENTITY, &IDENTITY, &u);
        assert_eq!(raw, [0.25, -0.5, 2.75, 1.0]);

        let smoothed = VertexInput {
            smoothed_normal: Some([1.0, 0.0, 0.0]),
            ..INPUT
        };
        let clip = outline_vertex(&smoothed, &IDENTITY, &IDENTITY, &u);
        assert_eq!(clip, [2.25, -0.5, 0.75, 1.0]);
    }

    #[test]
    fn material_is_sanitized() {
        let u = uniforms(-3.0, 1.7, false);
        assert_eq!(u.thickness, 0.0);
        assert_eq!(u.depth_offset, 1.0);
        let u = uniforms(f32::NAN, f32::INFINITY, true);
        assert_eq!(u.thickness, 1.0);
        assert_eq!(u.depth_offset, 0.0);
        assert_eq!(u.depth_sign, -1.0);
    }

    #[test]
    fn fragment_is_flat_color() {
        let u = OutlineUniforms::from_material(
            &OutlineMaterial {
                color: [0.1, 0.2, 0.3, 0.5],
                ..Default::default()
            },
            false,
        );
        assert_eq!(outline_fragment(&u), [0.1, 0.2, 0.3, 0.5]);
        let white = OutlineUniforms::from_material(&OutlineMaterial::default(), false);
        assert_eq!(outline_fragment(&white), [1.0; 4]);
    }

    #[test]
    fn matrix_product_is_column_major() {
        let a = translation(1.0, 2.0, 3.0);
        let b = translation(-1.0, 0.5, 0.0);
        let p = transform_point(&mul_mat4(&a, &b), [0.0; 3]);
        assert_eq!(p, [0.0, 2.5, 3.0, 1.0]);
    }

    #[test]
    fn uniform_block_matches_wgsl_size() {
        assert_eq!(std::mem::size_of::<OutlineUniforms>(), 32);
    }
}
