//! Placed instances of a shared BVH.
//!
//! One BVH is built in local space and shared behind an `Arc`; each instance
//! only stores its placement. Rays are carried into local space with the
//! inverse transform, traversed, and the hit is carried back out. Nothing in
//! the BVH itself knows about the placement.
//!
//! The ray direction is transformed but never normalized, so a parameter `t`
//! names the same point in world and local space and the world ray's `t` can
//! be shrunk directly from the local result.

use std::sync::Arc;

use lumen_math::{Aabb, Mat3, Mat4, Mat4Ext, Ray};

use crate::{Bvh, BvhError, BvhResult, HitRecord, Query};

/// A BVH placed in the world by an affine transform.
#[derive(Debug, Clone)]
pub struct BvhInstance {
    bvh: Arc<Bvh>,
    /// Local-to-world
    transform: Mat4,
    /// World-to-local, applied to incoming rays
    inv_transform: Mat4,
    /// Carries local normals to world space
    normal_matrix: Mat3,
    /// Local bounds pushed through `transform`, for culling
    world_bounds: Aabb,
}

impl BvhInstance {
    /// Place `bvh` with the local-to-world `transform`.
    ///
    /// Fails if the transform cannot be inverted.
    pub fn new(bvh: Arc<Bvh>, transform: Mat4) -> BvhResult<Self> {
        let mut instance = Self {
            bvh,
            transform: Mat4::IDENTITY,
            inv_transform: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            world_bounds: Aabb::EMPTY,
        };
        instance.set_transform(transform)?;
        Ok(instance)
    }

    /// Move the instance. Recomputes the inverse and the world bounds.
    ///
    /// On error the previous placement is kept.
    pub fn set_transform(&mut self, transform: Mat4) -> BvhResult<()> {
        let det = transform.determinant();
        if det == 0.0 || !det.is_finite() || !transform.is_finite() {
            log::warn!("Rejecting instance transform with determinant {}", det);
            return Err(BvhError::SingularTransform);
        }

        self.transform = transform;
        self.inv_transform = transform.inverse();
        self.normal_matrix = transform.normal_matrix();
        self.world_bounds = transform.transform_aabb(&self.bvh.bounds());
        Ok(())
    }

    pub fn bvh(&self) -> &Arc<Bvh> {
        &self.bvh
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inv_transform(&self) -> Mat4 {
        self.inv_transform
    }

    /// World-space box around the placed geometry.
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Trace a world-space ray against this instance.
    ///
    /// Same contract as [`Bvh::intersect`]: on a hit `ray.t` shrinks and
    /// `rec` is overwritten, with the point and normal in world space. On a
    /// miss neither is touched.
    pub fn intersect(&self, ray: &mut Ray, rec: &mut HitRecord, query: Query) -> bool {
        if self.world_bounds.intersect(ray).is_none() {
            return false;
        }

        let mut local_ray = self.inv_transform.transform_ray(ray);
        let mut local_rec = HitRecord::default();
        if !self.bvh.intersect(&mut local_ray, &mut local_rec, query) {
            return false;
        }

        ray.t = local_ray.t;
        *rec = local_rec;
        rec.p = ray.at(ray.t);
        // The inverse-transpose keeps the local facing: dot(n, d) has the same sign in both spaces
        rec.normal = (self.normal_matrix * local_rec.normal).normalize_or_zero();
        true
    }

    pub fn closest_hit(&self, ray: &Ray) -> Option<HitRecord> {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Closest).then_some(rec)
    }

    pub fn occluded(&self, ray: &Ray) -> bool {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Any)
    }
}

/// A flat list of instances, tested one after another.
///
/// Each instance is culled by its world box against the current best
/// distance, so instances behind an earlier hit cost one slab test. Fine for
/// tens or hundreds of instances; there is no top-level tree.
#[derive(Debug, Clone, Default)]
pub struct InstanceSet {
    instances: Vec<BvhInstance>,
    bounds: Aabb,
}

impl InstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance and return its index.
    pub fn push(&mut self, instance: BvhInstance) -> usize {
        self.bounds.grow_aabb(&instance.world_bounds());
        self.instances.push(instance);
        self.instances.len() - 1
    }

    /// Place `bvh` once per transform.
    pub fn from_transforms(bvh: Arc<Bvh>, transforms: &[Mat4]) -> BvhResult<Self> {
        let mut set = Self::new();
        for transform in transforms {
            set.push(BvhInstance::new(Arc::clone(&bvh), *transform)?);
        }
        log::info!(
            "Created InstanceSet: {} instances of a {}-triangle BVH, world bounds {:?}",
            set.len(),
            bvh.triangles().len(),
            set.bounds
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[BvhInstance] {
        &self.instances
    }

    /// Move one instance and recompute the set's bounds.
    pub fn set_transform(&mut self, index: usize, transform: Mat4) -> BvhResult<()> {
        let len = self.instances.len();
        self.instances
            .get_mut(index)
            .ok_or(BvhError::InstanceOutOfRange { index, len })?
            .set_transform(transform)?;
        self.bounds = self
            .instances
            .iter()
            .fold(Aabb::EMPTY, |acc, inst| acc.union(&inst.world_bounds()));
        Ok(())
    }

    /// World box around every instance.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Trace `ray` against every instance. Returns the index of the instance
    /// that produced the final hit in `rec`, or `None` on a miss.
    ///
    /// With [`Query::Any`] the first instance hit ends the search.
    pub fn intersect(&self, ray: &mut Ray, rec: &mut HitRecord, query: Query) -> Option<usize> {
        let mut hit_instance = None;
        for (i, instance) in self.instances.iter().enumerate() {
            if instance.intersect(ray, rec, query) {
                hit_instance = Some(i);
                if query == Query::Any {
                    break;
                }
            }
        }
        hit_instance
    }

    /// Nearest hit across all instances, with the index of the instance hit.
    pub fn closest_hit(&self, ray: &Ray) -> Option<(usize, HitRecord)> {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Closest)
            .map(|i| (i, rec))
    }

    pub fn occluded(&self, ray: &Ray) -> bool {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Any).is_some()
    }
}
