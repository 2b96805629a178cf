//! Small `[f32; 3]` vector helpers and per-triangle quantities used by the smoother.

pub type Vec3 = [f32; 3];

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(v: Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

#[inline]
pub fn distance_squared(a: Vec3, b: Vec3) -> f32 {
    let d = sub(a, b);
    dot(d, d)
}

/// Normalize `v`, or `None` when its length is zero (or not finite).
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len = length(v);
    if len > 0.0 && len.is_finite() {
        Some(scale(v, 1.0 / len))
    } else {
        None
    }
}

/// Unnormalized face normal `(b - a) x (c - a)`; its length is twice the triangle area.
#[inline]
pub fn area_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    cross(sub(b, a), sub(c, a))
}

/// Unit face normal for counter-clockwise winding, `None` for a degenerate triangle.
///
/// `min_sine` is scale-free: the triangle is degenerate when `|(b - a) x (c - a)|` is at most
/// `min_sine * |b - a| * |c - a|`, i.e. the sine of the angle at `a` is at most `min_sine`.
/// Zero-length edges are always degenerate.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3, min_sine: f32) -> Option<Vec3> {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let n = cross(ab, ac);
    let len = length(n);
    if len <= min_sine * length(ab) * length(ac) || !len.is_finite() {
        return None;
    }
    Some(scale(n, 1.0 / len))
}

/// Angle in radians between `u` and `v`. Zero when either is zero-length.
pub fn angle_between(u: Vec3, v: Vec3) -> f32 {
    let (Some(u), Some(v)) = (try_normalize(u), try_normalize(v)) else {
        return 0.0;
    };
    dot(u, v).clamp(-1.0, 1.0).acos()
}

/// Interior angles (radians) at corners `a`, `b`, `c`.
pub fn corner_angles(a: Vec3, b: Vec3, c: Vec3) -> [f32; 3] {
    [
        angle_between(sub(b, a), sub(c, a)),
        angle_between(sub(a, b), sub(c, b)),
        angle_between(sub(a, c), sub(b, c)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn face_normal_follows_ccw_winding() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        assert_eq!(face_normal(a, b, c, 1e-12), Some([0.0, 0.0, 1.0]));
        assert_eq!(face_normal(a, c, b, 1e-12), Some([0.0, 0.0, -1.0]));
    }

    #[test]
    fn face_normal_rejects_collinear() {
        let n = face_normal([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], 1e-12);
        assert!(n.is_none());
    }

    #[test]
    fn degeneracy_does_not_depend_on_scale() {
        for s in [1e-7f32, 1.0, 1e6] {
            let n = face_normal([0.0, 0.0, 0.0], [s, 0.0, 0.0], [0.0, s, 0.0], 1e-6);
            assert_eq!(n, Some([0.0, 0.0, 1.0]), "scale {}", s);
        }
        // Sine of the angle at the first corner is ~1e-7.
        let sliver = face_normal([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1e-7, 0.0], 1e-6);
        assert!(sliver.is_none());
        let repeated = face_normal([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [2.0, 0.0, 0.0], 0.0);
        assert!(repeated.is_none());
    }

    #[test]
    fn right_isoceles_corner_angles() {
        let angles = corner_angles([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((angles[0] - FRAC_PI_2).abs() < 1e-6);
        assert!((angles[1] - FRAC_PI_4).abs() < 1e-6);
        assert!((angles[2] - FRAC_PI_4).abs() < 1e-6);
        assert!((angles.iter().sum::<f32>() - PI).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_does_not_normalize() {
        assert!(try_normalize([0.0; 3]).is_none());
        assert_eq!(angle_between([0.0; 3], [1.0, 0.0, 0.0]), 0.0);
    }
}
