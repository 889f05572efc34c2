//! Minimal math types used by per-draw and per-layer state.
//!
//! When the `glm-types` feature is enabled, [`Mat4`] is `nalgebra_glm`'s
//! real 4x4 matrix type and callers get all of its operator overloads.
//! Without the feature, a dependency-free column-major `[f32; 16]`
//! wrapper carries the same bytes so the rest of the core never needs to
//! know which representation is active.

#[cfg(feature = "glm-types")]
pub type Mat4 = nalgebra_glm::Mat4;

#[cfg(feature = "glm-types")]
pub fn identity() -> Mat4 {
    nalgebra_glm::identity()
}

/// Matrix product `a * b`, used to derive the `MODEL_VIEW` and
/// `MODEL_VIEW_PROJECTION` stock uniforms from a draw's pose and its
/// layer's view/projection matrices.
#[cfg(feature = "glm-types")]
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

#[cfg(feature = "glm-types")]
pub fn mat4_as_bytes(m: &Mat4) -> [u8; 64] {
    let mut out = [0u8; 64];
    for (i, v) in m.as_slice().iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
    out
}

/// Transforms a point by a column-major 4x4 matrix (w assumed 1,
/// perspective divide skipped since debug geometry never needs it).
#[cfg(feature = "glm-types")]
pub fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    let v = m * nalgebra_glm::vec4(p[0], p[1], p[2], 1.0);
    [v.x, v.y, v.z]
}

#[cfg(not(feature = "glm-types"))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4(pub [f32; 16]);

#[cfg(not(feature = "glm-types"))]
pub fn identity() -> Mat4 {
    let mut m = [0.0f32; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[15] = 1.0;
    Mat4(m)
}

/// Matrix product `a * b` for the dependency-free column-major
/// representation (both operands column-major `[f32; 16]`, OpenGL
/// convention: element `i + j*4` is row `i`, column `j`).
#[cfg(not(feature = "glm-types"))]
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let (a, b) = (&a.0, &b.0);
    let mut out = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0f32;
            for k in 0..4 {
                sum += a[row + k * 4] * b[k + col * 4];
            }
            out[row + col * 4] = sum;
        }
    }
    Mat4(out)
}

#[cfg(not(feature = "glm-types"))]
pub fn mat4_as_bytes(m: &Mat4) -> [u8; 64] {
    let mut out = [0u8; 64];
    for (i, v) in m.0.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
    out
}

/// Transforms a point by a column-major 4x4 matrix (w assumed 1,
/// perspective divide skipped since debug geometry never needs it).
#[cfg(not(feature = "glm-types"))]
pub fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    let e = &m.0;
    let mut out = [0.0f32; 3];
    for row in 0..3 {
        out[row] = e[row] * p[0] + e[row + 4] * p[1] + e[row + 8] * p[2] + e[row + 12];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_roundtrips_through_bytes() {
        let m = identity();
        let bytes = mat4_as_bytes(&m);
        assert_eq!(bytes.len(), 64);
    }

    #[test]
    fn identity_transform_is_a_no_op() {
        let m = identity();
        let p = transform_point(&m, [1.0, 2.0, 3.0]);
        assert_eq!(p, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn mat4_mul_by_identity_is_a_no_op() {
        let m = identity();
        let product = mat4_mul(&m, &m);
        assert_eq!(product, identity());
    }
}
