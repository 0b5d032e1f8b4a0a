//! Math utilities and types
//!
//! Provides the math aliases used by mesh snapshots and draw commands.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Bitwise key for a point, so identical positions hash identically.
///
/// NaN positions are not expected in mesh data.
pub fn point_bits(point: &Point3) -> [u32; 3] {
    [point.x.to_bits(), point.y.to_bits(), point.z.to_bits()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_bits_matches_for_equal_points() {
        let a = Point3::new(1.0, -2.0, 0.5);
        let b = Point3::new(1.0, -2.0, 0.5);
        assert_eq!(point_bits(&a), point_bits(&b));
        assert_ne!(point_bits(&a), point_bits(&Point3::new(1.0, 2.0, 0.5)));
    }
}
