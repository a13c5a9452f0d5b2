//! Binned SAH construction.
//!
//! Each node's triangles are bucketed by centroid into `config.bins`
//! equal-width bins per axis. The bin boundaries are the candidate split
//! planes; the cheapest one by `left_count * left_area + right_count * right_area`
//! wins if it beats keeping the node as a leaf.

use lumen_math::Aabb;

use crate::{Bvh, BvhNode, NodeKind, Triangle};

#[derive(Debug, Clone, Copy)]
struct Bin {
    bounds: Aabb,
    count: u32,
}

impl Default for Bin {
    fn default() -> Self {
        Self {
            bounds: Aabb::EMPTY,
            count: 0,
        }
    }
}

/// A candidate split: a bin boundary on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitPlane {
    pub axis: usize,
    /// Coordinate of the plane on `axis`
    pub position: f32,
    /// SAH cost of splitting here
    pub cost: f32,
    /// Last bin that goes left
    boundary: usize,
    centroid_min: f32,
    scale: f32,
    bins: usize,
}

#[inline]
fn bin_index(centroid: f32, centroid_min: f32, scale: f32, bins: usize) -> usize {
    // `as` saturates: negative and NaN land in bin 0
    (((centroid - centroid_min) * scale) as usize).min(bins - 1)
}

impl SplitPlane {
    /// True if a triangle with this centroid belongs to the left child.
    ///
    /// Uses the same bin mapping the cost was computed with, which is the
    /// test `centroid[axis] < position` without its rounding hazards.
    #[inline]
    pub fn goes_left(&self, tri: &Triangle) -> bool {
        let c = tri.centroid()[self.axis];
        bin_index(c, self.centroid_min, self.scale, self.bins) <= self.boundary
    }
}

/// Reorder `indices` in place so every triangle going left precedes every
/// triangle going right. Returns the number going left.
///
/// Two-pointer scan from both ends, one pass, not order preserving.
pub(crate) fn partition_indices(indices: &mut [u32], triangles: &[Triangle], split: &SplitPlane) -> usize {
    let mut i = 0;
    let mut j = indices.len();
    while i < j {
        if split.goes_left(&triangles[indices[i] as usize]) {
            i += 1;
        } else {
            j -= 1;
            indices.swap(i, j);
        }
    }
    i
}

impl Bvh {
    /// Split a leaf node if SAH says it pays off, then recurse into the children.
    pub(crate) fn subdivide(&mut self, node_idx: usize) {
        let node = self.nodes[node_idx];
        let NodeKind::Leaf { first, count } = node.kind() else {
            return;
        };

        if count <= self.config.leaf_size {
            return;
        }

        // Only reachable when every vertex is NaN
        if node.bounds().is_empty() {
            return;
        }

        let Some(split) = self.find_best_split_plane(first, count) else {
            return;
        };

        let no_split_cost = node.cost();
        if !(split.cost < no_split_cost) {
            return;
        }

        debug_assert!(first + count <= self.tri_idx.len(), "leaf range out of bounds");
        let left_count = partition_indices(
            &mut self.tri_idx[first..first + count],
            &self.triangles,
            &split,
        );

        if left_count == 0 || left_count == count {
            return;
        }

        let left = self.nodes_used;
        debug_assert!(left + 1 < self.nodes.len(), "node array exhausted");
        self.nodes_used += 2;

        self.nodes[left] = BvhNode::leaf(first, left_count);
        self.nodes[left + 1] = BvhNode::leaf(first + left_count, count - left_count);
        self.nodes[node_idx].make_internal(left);

        self.update_node_bounds(left);
        self.update_node_bounds(left + 1);

        log::trace!(
            "split node {} on axis {} at {:.4}: {} | {} (cost {:.4} < {:.4})",
            node_idx,
            split.axis,
            split.position,
            left_count,
            count - left_count,
            split.cost,
            no_split_cost
        );

        self.subdivide(left);
        self.subdivide(left + 1);
    }

    /// Binned SAH search over all three axes.
    ///
    /// Ties keep the first candidate found: x before y before z, and lower
    /// boundaries before higher ones. Boundaries that leave a side empty are
    /// skipped. Returns `None` when no axis has any centroid spread.
    pub(crate) fn find_best_split_plane(&self, first: usize, count: usize) -> Option<SplitPlane> {
        let bin_count = self.config.bins;
        let indices = &self.tri_idx[first..first + count];

        let mut best: Option<SplitPlane> = None;
        let mut bins = vec![Bin::default(); bin_count];
        let mut right_area = vec![0.0f32; bin_count - 1];
        let mut right_count = vec![0u32; bin_count - 1];

        for axis in 0..3 {
            let mut centroid_min = f32::INFINITY;
            let mut centroid_max = f32::NEG_INFINITY;
            for &ti in indices {
                let c = self.triangles[ti as usize].centroid()[axis];
                centroid_min = centroid_min.min(c);
                centroid_max = centroid_max.max(c);
            }

            let extent = centroid_max - centroid_min;
            if !(extent > 0.0) || !extent.is_finite() {
                continue;
            }

            // Phase 1: bin every triangle by centroid
            let scale = bin_count as f32 / extent;
            bins.fill(Bin::default());
            for &ti in indices {
                let tri = &self.triangles[ti as usize];
                let bin = &mut bins[bin_index(tri.centroid()[axis], centroid_min, scale, bin_count)];
                bin.count += 1;
                for v in tri.vertices() {
                    bin.bounds.grow(v);
                }
            }

            // Phase 2: right-to-left sweep
            let mut right_box = Aabb::EMPTY;
            let mut right_sum = 0u32;
            for i in (1..bin_count).rev() {
                right_box.grow_aabb(&bins[i].bounds);
                right_sum += bins[i].count;
                right_count[i - 1] = right_sum;
                right_area[i - 1] = if right_box.is_empty() { f32::NAN } else { right_box.area() };
            }

            // Phase 3: left-to-right sweep, evaluating each boundary
            let mut left_box = Aabb::EMPTY;
            let mut left_sum = 0u32;
            for i in 0..bin_count - 1 {
                left_box.grow_aabb(&bins[i].bounds);
                left_sum += bins[i].count;
                if left_sum == 0 || right_count[i] == 0 || left_box.is_empty() {
                    continue;
                }

                let cost = left_sum as f32 * left_box.area() + right_count[i] as f32 * right_area[i];
                if cost.is_nan() {
                    continue;
                }

                if best.map_or(true, |b| cost < b.cost) {
                    best = Some(SplitPlane {
                        axis,
                        position: centroid_min + extent * (i + 1) as f32 / bin_count as f32,
                        cost,
                        boundary: i,
                        centroid_min,
                        scale,
                        bins: bin_count,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BvhConfig;
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tri_at(center: Vec3) -> Triangle {
        Triangle::new(
            center + Vec3::new(-0.5, -0.5, 0.0),
            center + Vec3::new(0.5, -0.5, 0.0),
            center + Vec3::new(0.0, 0.5, 0.0),
            0,
        )
    }

    fn random_soup(rng: &mut StdRng, n: usize, spread: f32) -> Vec<Triangle> {
        (0..n)
            .map(|_| {
                let c = Vec3::new(
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                );
                let mut jitter = || Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                Triangle::new(c + jitter(), c + jitter(), c + jitter(), 0)
            })
            .collect()
    }

    /// Triangles under a node, counted through internal nodes.
    fn subtree_count(bvh: &Bvh, idx: usize) -> usize {
        match bvh.nodes()[idx].kind() {
            NodeKind::Leaf { count, .. } => count,
            NodeKind::Internal { left, right } => subtree_count(bvh, left) + subtree_count(bvh, right),
        }
    }

    fn check_permutation(bvh: &Bvh) {
        let n = bvh.triangles().len();
        let mut seen = vec![false; n];
        let mut covered = 0;
        for node in bvh.nodes() {
            if let NodeKind::Leaf { first, count } = node.kind() {
                for &ti in &bvh.tri_indices()[first..first + count] {
                    assert!(!seen[ti as usize], "triangle {} referenced twice", ti);
                    seen[ti as usize] = true;
                }
                covered += count;
            }
        }
        assert_eq!(covered, n, "leaves must cover every triangle exactly once");
        assert!(seen.iter().all(|&s| s));
    }

    fn check_bounds(bvh: &Bvh) {
        for (i, node) in bvh.nodes().iter().enumerate() {
            let expected = match node.kind() {
                NodeKind::Leaf { first, count } => bvh.leaf_bounds(first, count),
                NodeKind::Internal { left, right } => {
                    assert!(left > i, "children are allocated after the parent");
                    assert!(right < bvh.nodes_used());
                    bvh.nodes()[left].bounds().union(&bvh.nodes()[right].bounds())
                }
            };
            assert_eq!(node.bounds(), expected, "node {} is not tight", i);
        }
    }

    fn check_sah_rule(bvh: &Bvh) {
        for node in bvh.nodes() {
            if let NodeKind::Internal { left, right } = node.kind() {
                let l = &bvh.nodes()[left];
                let r = &bvh.nodes()[right];
                let lc = subtree_count(bvh, left);
                let rc = subtree_count(bvh, right);
                let split_cost = lc as f32 * l.bounds().area() + rc as f32 * r.bounds().area();
                let leaf_cost = (lc + rc) as f32 * node.bounds().area();
                assert!(
                    split_cost < leaf_cost,
                    "split cost {} must beat leaf cost {}",
                    split_cost,
                    leaf_cost
                );
            }
        }
    }

    #[test]
    fn test_two_far_triangles_split_on_x() {
        let left = tri_at(Vec3::new(-100.0, 0.0, 0.0));
        let right = tri_at(Vec3::new(100.0, 0.0, 0.0));

        // A leaf floor of 1 lets the pair split; the default floor keeps it whole
        for bins in [2, 3, 8] {
            let bvh = Bvh::build(vec![left, right], &BvhConfig { bins, leaf_size: 1 }).unwrap();
            let split = bvh.find_best_split_plane(0, 2).unwrap();
            assert_eq!(split.axis, 0);
            assert!(split.position > -100.0 && split.position < 100.0);

            assert_eq!(bvh.nodes_used(), 3);
            let root = bvh.root().unwrap();
            let NodeKind::Internal { left: l, right: r } = root.kind() else {
                panic!("root should be internal");
            };
            assert_eq!(bvh.nodes()[l].kind(), NodeKind::Leaf { first: 0, count: 1 });
            assert_eq!(bvh.nodes()[r].kind(), NodeKind::Leaf { first: 1, count: 1 });
            assert!(bvh.nodes()[l].bounds().max.x < 0.0);
            assert!(bvh.nodes()[r].bounds().min.x > 0.0);
        }
    }

    #[test]
    fn test_leaf_floor_is_respected() {
        let left = tri_at(Vec3::new(-100.0, 0.0, 0.0));
        let right = tri_at(Vec3::new(100.0, 0.0, 0.0));

        // Default leaf size is 2: never split two triangles
        let bvh = Bvh::new(vec![left, right]);
        assert_eq!(bvh.nodes_used(), 1);
        assert_eq!(bvh.root().unwrap().kind(), NodeKind::Leaf { first: 0, count: 2 });

        // The split is still found; it just is not taken
        assert_eq!(bvh.find_best_split_plane(0, 2).map(|s| s.axis), Some(0));
    }

    #[test]
    fn test_ties_prefer_first_axis() {
        // Centroids spread equally along x and y: identical costs on both axes
        let tris = vec![
            tri_at(Vec3::new(-50.0, -50.0, 0.0)),
            tri_at(Vec3::new(50.0, 50.0, 0.0)),
            tri_at(Vec3::new(50.0, 50.0, 0.0)),
        ];
        let bvh = Bvh::build(tris, &BvhConfig { bins: 4, leaf_size: 1 }).unwrap();
        let split = bvh.find_best_split_plane(0, 3).unwrap();
        assert_eq!(split.axis, 0);
        assert_eq!(split.boundary, 0);
    }

    #[test]
    fn test_nan_vertices_do_not_panic() {
        let mut tris: Vec<Triangle> = (0..10).map(|i| tri_at(Vec3::new(i as f32, 0.0, 0.0))).collect();
        tris.push(Triangle::new(Vec3::NAN, Vec3::NAN, Vec3::NAN, 0));
        tris.push(Triangle::new(Vec3::new(3.0, f32::NAN, 0.0), Vec3::X, Vec3::Y, 0));

        let bvh = Bvh::new(tris);
        check_permutation(&bvh);
        let _ = bvh.stats();
    }

    #[test]
    fn test_identical_centroids_stay_leaf() {
        let tris = vec![tri_at(Vec3::ZERO); 10];
        let bvh = Bvh::new(tris);

        assert_eq!(bvh.nodes_used(), 1);
        assert_eq!(bvh.root().unwrap().kind(), NodeKind::Leaf { first: 0, count: 10 });
    }

    #[test]
    fn test_degenerate_triangles_build() {
        // Zero-area triangles on a line: every box is flat in y and z
        let tris: Vec<Triangle> = (0..16)
            .map(|i| {
                let x = i as f32;
                Triangle::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 0.5, 0.0, 0.0), Vec3::new(x + 0.25, 0.0, 0.0), 0)
            })
            .collect();
        let bvh = Bvh::new(tris);

        // Zero area everywhere: no split can strictly beat a zero leaf cost
        assert_eq!(bvh.nodes_used(), 1);
        check_permutation(&bvh);
        check_bounds(&bvh);
    }

    #[test]
    fn test_partition_indices() {
        let tris: Vec<Triangle> = (0..6).map(|i| tri_at(Vec3::new(i as f32 * 10.0, 0.0, 0.0))).collect();
        let bvh = Bvh::build(tris.clone(), &BvhConfig { bins: 2, leaf_size: 6 }).unwrap();
        let split = bvh.find_best_split_plane(0, 6).unwrap();

        let mut indices: Vec<u32> = (0..6).collect();
        let left = partition_indices(&mut indices, &tris, &split);

        assert_eq!(left, 3);
        for &i in &indices[..left] {
            assert!(tris[i as usize].centroid().x < split.position);
        }
        for &i in &indices[left..] {
            assert!(tris[i as usize].centroid().x >= split.position);
        }

        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<u32>>());
    }

    #[test]
    fn test_random_soups_hold_invariants() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for &bins in &[2usize, 3, 8, 16] {
            for &n in &[1usize, 2, 3, 17, 200, 1000] {
                let tris = random_soup(&mut rng, n, 50.0);
                let bvh = Bvh::build(tris, &BvhConfig::with_bins(bins)).unwrap();

                assert!(bvh.nodes_used() <= 2 * n - 1);
                check_permutation(&bvh);
                check_bounds(&bvh);
                check_sah_rule(&bvh);

                for node in bvh.nodes() {
                    if let NodeKind::Leaf { count, .. } = node.kind() {
                        assert!(count >= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_clustered_soup_holds_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tris = random_soup(&mut rng, 300, 0.01);
        tris.extend(random_soup(&mut rng, 5, 1000.0));

        let bvh = Bvh::build(tris, &BvhConfig::with_bins(3)).unwrap();
        check_permutation(&bvh);
        check_bounds(&bvh);
        check_sah_rule(&bvh);
    }
}
