//! Mesh geometry representation for lumen.
//!
//! A mesh is the hand-off format between whatever loads geometry (OBJ files,
//! procedural generators, animation) and the BVH that accelerates it. It is
//! deliberately plain: positions, triangle indices and one material index.

use lumen_math::{Aabb, Mat4, Vec3};
use thiserror::Error;

/// Errors that make a mesh unusable for BVH construction.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Vertex {index} has a non-finite position")]
    NonFinitePosition { index: usize },

    #[error("Triangle index {index} out of range (vertex count: {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Index count {len} is not a multiple of 3")]
    IncompleteTriangle { len: usize },
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// A mesh consisting of vertex positions and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Material index shared by every triangle of the mesh
    pub material: u32,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_vertices(&positions);
        Self {
            positions,
            indices,
            material: 0,
            bounds,
        }
    }

    /// Set the material index.
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = material;
        self
    }

    /// Build a mesh from a triangle soup, one `[v0, v1, v2]` per triangle.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let positions: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, indices)
    }

    /// Check the mesh before it is handed to the BVH.
    ///
    /// Rejects non-finite positions, a trailing partial triangle and
    /// out-of-range indices.
    pub fn validate(&self) -> MeshResult<()> {
        if let Some(index) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFinitePosition { index });
        }

        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle {
                len: self.indices.len(),
            });
        }

        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(())
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Extract triangle vertices as `[v0, v1, v2]` triplets.
    ///
    /// Triangles referencing missing vertices are skipped with a warning, so
    /// the result may be shorter than `triangle_count()`. Call `validate()`
    /// first when every triangle must survive.
    pub fn extract_triangle_vertices(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            // Bounds check
            if i0 >= self.positions.len()
                || i1 >= self.positions.len()
                || i2 >= self.positions.len()
            {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    self.positions.len()
                );
                continue;
            }

            triangles.push([self.positions[i0], self.positions[i1], self.positions[i2]]);
        }

        triangles
    }

    /// A copy of this mesh with every position moved by `transform`.
    ///
    /// Topology (indices, triangle count) is unchanged, which is what lets a
    /// BVH built over the original be refit to the result.
    pub fn transformed(&self, transform: &Mat4) -> Mesh {
        let positions = self
            .positions
            .iter()
            .map(|&p| transform.transform_point3(p))
            .collect();
        Mesh::new(positions, self.indices.clone()).with_material(self.material)
    }
}
