//! Conversions between host-side arrays and nalgebra poses.
//!
//! The host passes quaternions as `[x, y, z, w]`.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

/// Build a unit quaternion from `[x, y, z, w]`.
///
/// A degenerate (zero-length or non-finite) quaternion maps to identity so
/// that every numeric input yields a valid orientation.
pub fn quat_from_xyzw(q: [f32; 4]) -> UnitQuaternion<f32> {
    let raw = Quaternion::new(q[3], q[0], q[1], q[2]);
    let norm = raw.norm();
    if !norm.is_finite() || norm <= f32::EPSILON {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::new_unchecked(raw / norm)
}

/// Unit quaternion back to `[x, y, z, w]`.
pub fn quat_to_xyzw(q: &UnitQuaternion<f32>) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

/// Pose from a position and an `[x, y, z, w]` quaternion.
pub fn isometry(position: [f32; 3], rotation: [f32; 4]) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(position[0], position[1], position[2]),
        quat_from_xyzw(rotation),
    )
}

/// Vector to a plain array.
pub fn vec_to_array(v: &Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Plain array to a vector.
pub fn array_to_vec(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_quaternion_is_identity() {
        let q = quat_from_xyzw([0.0, 0.0, 0.0, 0.0]);
        assert_eq!(q, UnitQuaternion::identity());
    }

    #[test]
    fn test_component_order() {
        let q = quat_from_xyzw([0.0, 0.0, 1.0, 1.0]);
        let xyzw = quat_to_xyzw(&q);
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(xyzw[2], h, epsilon = 1e-6);
        assert_relative_eq!(xyzw[3], h, epsilon = 1e-6);
        assert_relative_eq!(q.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
    }
}
