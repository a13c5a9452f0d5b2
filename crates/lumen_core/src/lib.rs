//! Lumen Core - Triangle mesh input for the lumen BVH.
//!
//! This crate provides:
//!
//! - **Mesh geometry**: `Mesh`, validation, triangle extraction and re-posing
//! - **OBJ support**: Wavefront OBJ loading via `tobj`
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::obj::load_obj;
//!
//! let meshes = load_obj("bunny.obj")?;
//! for mesh in &meshes {
//!     mesh.validate()?;
//!     println!("{} triangles", mesh.triangle_count());
//! }
//! ```

pub mod mesh;
pub mod obj;

// Re-export commonly used types
pub use mesh::{Mesh, MeshError, MeshResult};
pub use obj::{load_obj, load_obj_from_reader};
