//! HitRecord and query modes for ray-BVH intersection.

use crate::{Triangle, TriangleHit};
use lumen_math::{Ray, Vec3};

/// What a traversal is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Query {
    /// The globally nearest hit. Shrinks `ray.t` as closer hits are found.
    #[default]
    Closest,
    /// Any hit at all (shadow rays). Stops at the first one.
    Any,
}

/// Record of a ray-triangle intersection.
///
/// Owned by the caller and overwritten in place whenever a closer hit is
/// found, so one record can be threaded through several queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Whether the ray hit the front face of the triangle
    pub front_face: bool,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Barycentric coordinates of the hit
    pub u: f32,
    pub v: f32,
    /// Material index of the hit triangle
    pub material: u32,
    /// Index of the hit triangle in the BVH's triangle array
    pub triangle: u32,
    /// Whether anything was hit
    pub did_hit: bool,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            front_face: false,
            t: f32::INFINITY,
            u: 0.0,
            v: 0.0,
            material: 0,
            triangle: 0,
            did_hit: false,
        }
    }
}

impl HitRecord {
    /// Overwrite the record with a triangle hit.
    ///
    /// The point is recomputed from the ray so equal distances always give
    /// identical points.
    pub(crate) fn record(&mut self, ray: &Ray, hit: &TriangleHit, tri: &Triangle, tri_index: usize) {
        self.t = hit.t;
        self.p = ray.at(hit.t);
        self.set_face_normal(ray, tri.normal());
        self.u = hit.u;
        self.v = hit.v;
        self.material = tri.material();
        self.triangle = tri_index as u32;
        self.did_hit = true;
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}
