// Transform utilities for Mat4
//
// Extends glam::Mat4 with the operations instancing needs: moving rays into
// an instance's local space and moving boxes and normals back out.

use glam::{Mat3, Mat4, Vec3};
use crate::{Aabb, Ray};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a ray, keeping its distance range.
    ///
    /// The direction is transformed as a vector and deliberately left
    /// un-normalized, so a hit at parameter `t` in the transformed space is
    /// the same point as parameter `t` in the original space.
    fn transform_ray(&self, ray: &Ray) -> Ray;

    /// Matrix that carries surface normals through this transform
    /// (inverse-transpose of the upper 3x3).
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let (min_point, max_point) = (aabb.min, aabb.max);
        let corners = [
            Vec3::new(min_point.x, min_point.y, min_point.z),
            Vec3::new(max_point.x, min_point.y, min_point.z),
            Vec3::new(min_point.x, max_point.y, min_point.z),
            Vec3::new(max_point.x, max_point.y, min_point.z),
            Vec3::new(min_point.x, min_point.y, max_point.z),
            Vec3::new(max_point.x, min_point.y, max_point.z),
            Vec3::new(min_point.x, max_point.y, max_point.z),
            Vec3::new(max_point.x, max_point.y, max_point.z),
        ];

        let mut result = Aabb::EMPTY;
        for corner in corners {
            result.grow(self.transform_point3(corner));
        }
        result
    }

    fn transform_ray(&self, ray: &Ray) -> Ray {
        Ray::with_max_distance(
            self.transform_point3(ray.origin()),
            self.transform_vector3(ray.direction()),
            ray.t,
        )
        .with_min_distance(ray.t_min())
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }
}
