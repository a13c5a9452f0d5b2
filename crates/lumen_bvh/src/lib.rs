//! Lumen BVH - triangle acceleration structure for CPU ray tracing
//!
//! A binned-SAH bounding volume hierarchy over an owned triangle array,
//! stored as a flat node array plus an index permutation. Supports
//! closest-hit and occlusion queries, batch tracing on the rayon pool,
//! bottom-up refit for animated geometry, and placing one shared BVH many
//! times through affine instance transforms.
//!
//! ```ignore
//! let bvh = Bvh::from_mesh(&mesh, &BvhConfig::default())?;
//! let mut ray = Ray::new(origin, direction);
//! let mut rec = HitRecord::default();
//! if bvh.intersect(&mut ray, &mut rec, Query::Closest) {
//!     shade(rec.p, rec.normal, rec.material);
//! }
//! ```

mod builder;
mod bvh;
mod config;
mod hit;
mod instance;
mod node;
mod traverse;
mod triangle;

pub use bvh::{Bvh, BvhStats};
pub use config::{BvhConfig, BvhError, BvhResult, MAX_BINS};
pub use hit::{HitRecord, Query};
pub use instance::{BvhInstance, InstanceSet};
pub use node::{BvhNode, NodeKind};
pub use triangle::{Triangle, TriangleHit};

/// Re-export the math types that appear in the public API
pub use lumen_math::{Aabb, Mat4, Ray, Vec3};
