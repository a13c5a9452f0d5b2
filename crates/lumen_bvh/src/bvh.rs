//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is a flat array of [`BvhNode`]s pre-sized to `2N - 1` (one
//! triangle per leaf is the worst case) plus a permutation of the triangle
//! indices. Construction reorders only the permutation; every leaf owns a
//! contiguous range of it. The root is always node 0.

use std::time::Instant;

use lumen_core::Mesh;
use lumen_math::Aabb;

use crate::{BvhConfig, BvhError, BvhNode, BvhResult, NodeKind, Triangle};

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BvhStats {
    /// Nodes in use
    pub nodes: usize,
    /// Leaf nodes
    pub leaves: usize,
    /// Deepest leaf (the root is depth 0)
    pub max_depth: usize,
    /// Most triangles in a single leaf
    pub max_leaf_size: usize,
    /// SAH cost relative to the root: sum of internal node areas plus
    /// `count * area` over leaves, divided by the root area
    pub sah_cost: f32,
}

/// BVH over an owned triangle array.
///
/// Nodes, triangles and the index permutation are built, refit and dropped
/// together. Once built, queries take `&self` and may run from any number of
/// threads; `refit` and `update_from_mesh` need `&mut self`, so the borrow
/// checker keeps them from overlapping a query.
#[derive(Debug, Clone)]
pub struct Bvh {
    pub(crate) nodes: Vec<BvhNode>,
    pub(crate) nodes_used: usize,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) tri_idx: Vec<u32>,
    pub(crate) config: BvhConfig,
}

impl Bvh {
    /// Build a BVH with the default configuration.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mut bvh = Self::unbuilt(triangles, BvhConfig::default());
        bvh.build_tree();
        bvh
    }

    /// Build a BVH with an explicit configuration.
    pub fn build(triangles: Vec<Triangle>, config: &BvhConfig) -> BvhResult<Self> {
        config.validate()?;
        let mut bvh = Self::unbuilt(triangles, *config);
        bvh.build_tree();
        Ok(bvh)
    }

    /// Build a BVH over a validated mesh. Every triangle takes the mesh's material.
    pub fn from_mesh(mesh: &Mesh, config: &BvhConfig) -> BvhResult<Self> {
        mesh.validate()?;
        let triangles = mesh
            .extract_triangle_vertices()
            .into_iter()
            .map(|[v0, v1, v2]| Triangle::new(v0, v1, v2, mesh.material))
            .collect();
        Self::build(triangles, config)
    }

    fn unbuilt(triangles: Vec<Triangle>, config: BvhConfig) -> Self {
        let n = triangles.len();
        debug_assert!(n <= u32::MAX as usize / 2, "too many triangles for u32 node links");

        let nodes = if n == 0 {
            Vec::new()
        } else {
            vec![BvhNode::default(); 2 * n - 1]
        };

        Self {
            nodes,
            nodes_used: 0,
            tri_idx: (0..n as u32).collect(),
            triangles,
            config,
        }
    }

    fn build_tree(&mut self) {
        if self.triangles.is_empty() {
            log::warn!("BVH built over an empty mesh; every query will miss");
            return;
        }

        let start = Instant::now();

        self.nodes[0] = BvhNode::leaf(0, self.triangles.len());
        self.nodes_used = 1;
        self.update_node_bounds(0);
        self.subdivide(0);

        let stats = self.stats();
        log::info!(
            "BVH: {} triangles, {} nodes ({} leaves), depth {}, max leaf {}, SAH {:.2}, {} bins, built in {:?}",
            self.triangles.len(),
            stats.nodes,
            stats.leaves,
            stats.max_depth,
            stats.max_leaf_size,
            stats.sah_cost,
            self.config.bins,
            start.elapsed()
        );
    }

    /// Tight box around the triangles of a leaf range.
    pub(crate) fn leaf_bounds(&self, first: usize, count: usize) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for &ti in &self.tri_idx[first..first + count] {
            bounds.grow_aabb(&self.triangles[ti as usize].bounds());
        }
        bounds
    }

    /// Recompute a leaf's bounds from its triangles. Internal nodes are left alone.
    pub(crate) fn update_node_bounds(&mut self, node_idx: usize) {
        if let NodeKind::Leaf { first, count } = self.nodes[node_idx].kind() {
            let bounds = self.leaf_bounds(first, count);
            self.nodes[node_idx].set_bounds(bounds);
        }
    }

    /// Recompute every node's bounds from the current triangle positions,
    /// keeping the tree topology.
    ///
    /// Children are always allocated after their parent, so walking the node
    /// array backwards refits both children before the parent that unions them.
    pub fn refit(&mut self) {
        if self.is_empty() {
            return;
        }

        let start = Instant::now();
        for i in (0..self.nodes_used).rev() {
            match self.nodes[i].kind() {
                NodeKind::Leaf { .. } => self.update_node_bounds(i),
                NodeKind::Internal { left, right } => {
                    debug_assert!(left > i && right < self.nodes_used, "child index out of order");
                    let bounds = self.nodes[left].bounds().union(&self.nodes[right].bounds());
                    self.nodes[i].set_bounds(bounds);
                }
            }
        }
        log::debug!("BVH refit: {} nodes in {:?}", self.nodes_used, start.elapsed());
    }

    /// Mutable access to the triangles for animation. Call [`Bvh::refit`] afterwards.
    ///
    /// Positions may change freely; the tree topology stays as built.
    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }

    /// Re-pose every triangle from `mesh` and refit.
    ///
    /// The mesh must have the same triangle count as the BVH, in the same
    /// order it had when the BVH was built.
    pub fn update_from_mesh(&mut self, mesh: &Mesh) -> BvhResult<()> {
        mesh.validate()?;
        let posed = mesh.extract_triangle_vertices();
        if posed.len() != self.triangles.len() {
            log::warn!(
                "Refusing to refit: BVH has {} triangles, mesh has {}",
                self.triangles.len(),
                posed.len()
            );
            return Err(BvhError::TopologyMismatch {
                expected: self.triangles.len(),
                found: posed.len(),
            });
        }

        for (tri, [v0, v1, v2]) in self.triangles.iter_mut().zip(posed) {
            tri.set_vertices(v0, v1, v2);
        }
        self.refit();
        Ok(())
    }

    /// True if the BVH holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.nodes_used == 0
    }

    /// The nodes in use. Index 0 is the root.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes[..self.nodes_used]
    }

    pub fn nodes_used(&self) -> usize {
        self.nodes_used
    }

    /// The used nodes as raw bytes, 32 per node.
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.nodes())
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes().first()
    }

    /// Bounds of the whole tree; empty for an empty BVH.
    pub fn bounds(&self) -> Aabb {
        self.root().map_or(Aabb::EMPTY, BvhNode::bounds)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The triangle index permutation. Leaves reference ranges of this array.
    pub fn tri_indices(&self) -> &[u32] {
        &self.tri_idx
    }

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// Walk the tree and summarize its shape.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            nodes: self.nodes_used,
            ..Default::default()
        };
        let Some(root) = self.root() else {
            return stats;
        };

        let mut cost = 0.0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            match node.kind() {
                NodeKind::Leaf { count, .. } => {
                    stats.leaves += 1;
                    stats.max_depth = stats.max_depth.max(depth);
                    stats.max_leaf_size = stats.max_leaf_size.max(count);
                    cost += node.cost();
                }
                NodeKind::Internal { left, right } => {
                    cost += node.bounds().area();
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }

        let root_area = if root.bounds().is_empty() { 0.0 } else { root.bounds().area() };
        if root_area > 0.0 {
            stats.sah_cost = cost / root_area;
        }
        stats
    }
}
