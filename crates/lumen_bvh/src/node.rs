//! Flat BVH node record.
//!
//! Nodes live in one array. A node's `tri_count` is the discriminant:
//! zero means internal, anything else means leaf. The other payload field,
//! `left_first`, is either the index of the first child (the second child
//! is always the next slot) or the offset of the leaf's first entry in the
//! triangle index array. Code outside this module goes through
//! [`BvhNode::kind`] instead of reading the raw fields.

use bytemuck::{Pod, Zeroable};
use lumen_math::{Aabb, Vec3};

/// BVH node, 32 bytes, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub aabb_min: Vec3,
    pub left_first: u32,
    pub aabb_max: Vec3,
    pub tri_count: u32,
}

/// Decoded view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Internal node with two children. `right` is always `left + 1`.
    Internal { left: usize, right: usize },
    /// Leaf referencing `count` consecutive entries of the triangle index array.
    Leaf { first: usize, count: usize },
}

impl BvhNode {
    /// A leaf over `count` index entries starting at `first`, with empty bounds.
    pub(crate) fn leaf(first: usize, count: usize) -> Self {
        debug_assert!(count > 0, "a leaf must reference at least one triangle");
        Self {
            aabb_min: Aabb::EMPTY.min,
            left_first: first as u32,
            aabb_max: Aabb::EMPTY.max,
            tri_count: count as u32,
        }
    }

    /// Turn this node into an internal node whose children start at `left`.
    pub(crate) fn make_internal(&mut self, left: usize) {
        self.left_first = left as u32;
        self.tri_count = 0;
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.tri_count > 0
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        if self.is_leaf() {
            NodeKind::Leaf {
                first: self.left_first as usize,
                count: self.tri_count as usize,
            }
        } else {
            let left = self.left_first as usize;
            NodeKind::Internal {
                left,
                right: left + 1,
            }
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.aabb_min,
            max: self.aabb_max,
        }
    }

    #[inline]
    pub(crate) fn set_bounds(&mut self, bounds: Aabb) {
        self.aabb_min = bounds.min;
        self.aabb_max = bounds.max;
    }

    /// SAH cost of keeping this node as a leaf: `tri_count * area`.
    /// Internal nodes and leaves with empty bounds cost nothing here.
    pub fn cost(&self) -> f32 {
        if self.is_leaf() && !self.bounds().is_empty() {
            self.tri_count as f32 * self.bounds().area()
        } else {
            0.0
        }
    }
}
