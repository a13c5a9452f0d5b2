//! Ray traversal: closest-hit and occlusion queries.

use lumen_math::Ray;
use rayon::prelude::*;

use crate::{Bvh, HitRecord, NodeKind, Query};

impl Bvh {
    /// Trace `ray` through the tree.
    ///
    /// With [`Query::Closest`] every subtree whose box could still hold a
    /// closer hit is visited, nearer child first, and `ray.t` / `rec` end up
    /// describing the nearest hit. With [`Query::Any`] traversal stops at the
    /// first accepted triangle; `rec` still describes that triangle.
    ///
    /// Returns true if `rec` was written. The ray must already be in the
    /// BVH's local space.
    pub fn intersect(&self, ray: &mut Ray, rec: &mut HitRecord, query: Query) -> bool {
        let Some(root) = self.root() else {
            return false;
        };
        if root.bounds().intersect(ray).is_none() {
            return false;
        }
        self.intersect_node(0, ray, rec, query)
    }

    fn intersect_node(&self, node_idx: usize, ray: &mut Ray, rec: &mut HitRecord, query: Query) -> bool {
        match self.nodes[node_idx].kind() {
            NodeKind::Leaf { first, count } => {
                let mut hit = false;
                for &ti in &self.tri_idx[first..first + count] {
                    let tri = &self.triangles[ti as usize];
                    if let Some(tri_hit) = tri.intersect(ray) {
                        ray.t = tri_hit.t;
                        rec.record(ray, &tri_hit, tri, ti as usize);
                        hit = true;
                        if query == Query::Any {
                            return true;
                        }
                    }
                }
                hit
            }
            NodeKind::Internal { left, right } => {
                let mut near = (left, self.nodes[left].bounds().intersect(ray));
                let mut far = (right, self.nodes[right].bounds().intersect(ray));

                // Misses sort last
                let entry = |d: Option<f32>| d.unwrap_or(f32::INFINITY);
                if entry(far.1) < entry(near.1) {
                    std::mem::swap(&mut near, &mut far);
                }

                let mut hit = false;
                if near.1.is_some() && self.intersect_node(near.0, ray, rec, query) {
                    if query == Query::Any {
                        return true;
                    }
                    hit = true;
                }

                // The near subtree may have shrunk ray.t past the far box
                if let Some(d) = far.1 {
                    if d < ray.t && self.intersect_node(far.0, ray, rec, query) {
                        hit = true;
                    }
                }
                hit
            }
        }
    }

    /// Nearest hit along `ray`, if any. The caller's ray is left untouched.
    pub fn closest_hit(&self, ray: &Ray) -> Option<HitRecord> {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Closest).then_some(rec)
    }

    /// True if anything lies along `ray` closer than `ray.t`.
    pub fn occluded(&self, ray: &Ray) -> bool {
        let mut ray = *ray;
        let mut rec = HitRecord::default();
        self.intersect(&mut ray, &mut rec, Query::Any)
    }

    /// Closest-hit query for many rays at once, spread over the rayon pool.
    ///
    /// Each ray's `t` is shrunk to its hit distance; misses keep their `t`
    /// and get a default (missed) record.
    pub fn intersect_batch(&self, rays: &mut [Ray]) -> Vec<HitRecord> {
        rays.par_iter_mut()
            .map(|ray| {
                let mut rec = HitRecord::default();
                self.intersect(ray, &mut rec, Query::Closest);
                rec
            })
            .collect()
    }
}
