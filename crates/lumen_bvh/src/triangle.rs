//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use lumen_math::{Aabb, Ray, Vec3};

/// Determinant below which a ray counts as parallel to the triangle plane.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A triangle primitive with cached centroid and face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Average of the three vertices, used for binning
    centroid: Vec3,
    /// Face normal (unit length, zero for degenerate triangles)
    normal: Vec3,
    /// Material index
    material: u32,
}

/// Result of a successful ray-triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Ray parameter of the hit
    pub t: f32,
    /// Barycentric weight of `v1`
    pub u: f32,
    /// Barycentric weight of `v2`
    pub v: f32,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: u32) -> Self {
        let mut tri = Self {
            v0,
            v1,
            v2,
            centroid: Vec3::ZERO,
            normal: Vec3::ZERO,
            material,
        };
        tri.set_vertices(v0, v1, v2);
        tri
    }

    /// Move the triangle, re-caching centroid and normal.
    pub fn set_vertices(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.v0 = v0;
        self.v1 = v1;
        self.v2 = v2;
        self.centroid = (v0 + v1 + v2) * (1.0 / 3.0);
        self.normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    #[inline]
    pub fn material(&self) -> u32 {
        self.material
    }

    /// Tight bounding box of the three vertices.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(self.v0);
        aabb.grow(self.v1);
        aabb.grow(self.v2);
        aabb
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    ///
    /// Reports a hit only when `ray.t_min() < t < ray.t`. Parallel rays and
    /// non-finite results are misses. Both faces are hit.
    pub fn intersect(&self, ray: &Ray) -> Option<TriangleHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle (or the triangle is degenerate)
        if !(a.abs() >= PARALLEL_EPSILON) {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);

        if t > ray.t_min() && t < ray.t && t.is_finite() {
            Some(TriangleHit { t, u, v })
        } else {
            None
        }
    }
}
