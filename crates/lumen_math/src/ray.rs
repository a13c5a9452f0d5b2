use crate::Vec3;

/// A ray in 3D space with origin, direction, and the current best hit distance.
///
/// The direction is not required to be unit length; hit distances are
/// measured in multiples of it. The reciprocal direction is cached for the
/// slab test, so origin and direction are only reachable through accessors.
/// `t` starts at infinity and only ever shrinks while closer hits are found.
/// Hits at or below `t_min` (zero unless set) are ignored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
    t_min: f32,
    /// Distance to the closest hit found so far
    pub t: f32,
}

impl Ray {
    /// Create a new ray with no hit recorded yet.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_max_distance(origin, direction, f32::INFINITY)
    }

    /// Create a ray that only reports hits closer than `t`.
    ///
    /// Shadow rays use this with the distance to the light.
    pub fn with_max_distance(origin: Vec3, direction: Vec3, t: f32) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            t_min: 0.0,
            t,
        }
    }

    /// Ignore hits at or below `t_min`, in units of the direction.
    ///
    /// Secondary rays leaving a surface use this to skip their own origin.
    pub fn with_min_distance(mut self, t_min: f32) -> Self {
        self.t_min = t_min;
        self
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Componentwise reciprocal of the direction. Zero components map to ±infinity.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    #[inline]
    pub fn t_min(&self) -> f32 {
        self.t_min
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
