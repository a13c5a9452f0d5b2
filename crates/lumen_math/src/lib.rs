// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod ray;
mod transform;

pub use aabb::{Aabb, EMPTY_SENTINEL};
pub use ray::Ray;
pub use transform::Mat4Ext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_min_max() {
        let a = Vec3::new(1.0, 5.0, 3.0);
        let b = Vec3::new(4.0, 2.0, 6.0);
        assert_eq!(a.min(b), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a.max(b), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_vec3_recip_of_zero_is_infinite() {
        let r = Vec3::new(0.0, -0.0, 2.0).recip();
        assert_eq!(r.x, f32::INFINITY);
        assert_eq!(r.y, f32::NEG_INFINITY);
        assert_eq!(r.z, 0.5);
    }
}
