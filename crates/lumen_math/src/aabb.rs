use crate::{Ray, Vec3};
use bytemuck::{Pod, Zeroable};

/// Magnitude used for the corners of an empty box.
pub const EMPTY_SENTINEL: f32 = 1e30;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An empty box has `min = +EMPTY_SENTINEL` and `max = -EMPTY_SENTINEL` on
/// every axis, so that growing it by any point yields exactly that point.
/// Boxes are never padded: `grow` always produces the minimal enclosing box.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// The empty box. Growing by it is a no-op.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(EMPTY_SENTINEL),
        max: Vec3::splat(-EMPTY_SENTINEL),
    };

    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Tight box around a set of points. Empty input yields [`Aabb::EMPTY`].
    pub fn from_vertices(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for &p in points {
            aabb.grow(p);
        }
        aabb
    }

    /// True when nothing has been grown into the box yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Widen the box to contain `p`.
    #[inline]
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Widen the box to contain `other`. Growing by an empty box does nothing.
    #[inline]
    pub fn grow_aabb(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.grow(other.min);
        self.grow(other.max);
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.grow_aabb(other);
        out
    }

    /// Edge lengths of the box.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half the surface area: `e.x*e.y + e.y*e.z + e.z*e.x`.
    ///
    /// This is the SAH cost weight; the dropped factor of two cancels in every
    /// comparison. Must not be called on an empty box.
    #[inline]
    pub fn area(&self) -> f32 {
        debug_assert!(!self.is_empty(), "area() of an empty Aabb");
        let e = self.extent();
        e.x * e.y + e.y * e.z + e.z * e.x
    }

    /// Slab test against the ray's reciprocal direction.
    ///
    /// Returns the entry distance when the slabs overlap, the box is not
    /// behind the origin, and the entry lies strictly before `ray.t`.
    /// The entry distance is negative when the origin is inside the box.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let origin = ray.origin();
        let rd = ray.inv_direction();

        let tx1 = (self.min.x - origin.x) * rd.x;
        let tx2 = (self.max.x - origin.x) * rd.x;
        let mut tmin = tx1.min(tx2);
        let mut tmax = tx1.max(tx2);

        let ty1 = (self.min.y - origin.y) * rd.y;
        let ty2 = (self.max.y - origin.y) * rd.y;
        tmin = tmin.max(ty1.min(ty2));
        tmax = tmax.min(ty1.max(ty2));

        let tz1 = (self.min.z - origin.z) * rd.z;
        let tz2 = (self.max.z - origin.z) * rd.z;
        tmin = tmin.max(tz1.min(tz2));
        tmax = tmax.min(tz1.max(tz2));

        if tmax >= tmin && tmin < ray.t && tmax > 0.0 {
            Some(tmin)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_empty() {
        let aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());
        assert_eq!(Aabb::default(), Aabb::EMPTY);
        assert_eq!(Aabb::from_vertices(&[]), Aabb::EMPTY);
    }

    #[test]
    fn test_aabb_grow_point_is_exact() {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(!aabb.is_empty());

        aabb.grow(Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn test_aabb_grow_is_monotone() {
        let mut aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        aabb.grow(Vec3::splat(5.0));
        assert_eq!(aabb, Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0)));
    }

    #[test]
    fn test_aabb_grow_by_empty_is_noop() {
        let mut aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        aabb.grow_aabb(&Aabb::EMPTY);
        assert_eq!(aabb, Aabb::from_points(Vec3::ZERO, Vec3::ONE));

        let mut empty = Aabb::EMPTY;
        empty.grow_aabb(&Aabb::EMPTY);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_aabb_union() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let union = box1.union(&box2);

        assert_eq!(union.min, Vec3::ZERO);
        assert_eq!(union.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_area() {
        let cube = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        assert_eq!(cube.area(), 3.0);

        let slab = Aabb::from_points(Vec3::ZERO, Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(slab.area(), 6.0);

        let point = Aabb::from_points(Vec3::ONE, Vec3::ONE);
        assert_eq!(point.area(), 0.0);
    }

    #[test]
    fn test_aabb_intersect() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect(&ray), Some(4.0));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(aabb.intersect(&ray), None);

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect(&ray), None);
    }

    #[test]
    fn test_aabb_intersect_respects_best_distance() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::with_max_distance(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 3.0);
        assert_eq!(aabb.intersect(&ray), None);

        let ray = Ray::with_max_distance(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 4.5);
        assert_eq!(aabb.intersect(&ray), Some(4.0));
    }

    #[test]
    fn test_aabb_intersect_from_inside() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = aabb.intersect(&ray).expect("origin inside the box");
        assert!(t < 0.0);
    }

    #[test]
    fn test_aabb_intersect_flat_box_axis_parallel_ray() {
        // Zero-thickness box in z, ray travelling along +z through it
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        assert_eq!(aabb.intersect(&ray), Some(1.0));
    }

    #[test]
    fn test_aabb_is_pod() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&aabb));
        assert_eq!(floats, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }
}
