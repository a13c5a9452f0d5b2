//! Wavefront OBJ loading.
//!
//! Every OBJ model becomes one triangulated `Mesh`. Material libraries are
//! not read; a model's material id becomes the mesh's material index.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lumen_math::Vec3;

use crate::mesh::{Mesh, MeshResult};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load every model in an OBJ file as a validated mesh.
pub fn load_obj<P: AsRef<Path>>(path: P) -> MeshResult<Vec<Mesh>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let meshes = load_obj_from_reader(&mut reader)?;

    log::info!(
        "Loaded {}: {} meshes, {} triangles",
        path.display(),
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>()
    );
    Ok(meshes)
}

/// Load OBJ data from any buffered reader.
pub fn load_obj_from_reader<R: BufRead>(reader: &mut R) -> MeshResult<Vec<Mesh>> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_: &Path| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;

    let mut meshes = Vec::with_capacity(models.len());
    for model in models {
        let positions: Vec<Vec3> = model
            .mesh
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let material = model.mesh.material_id.unwrap_or(0) as u32;

        let mesh = Mesh::new(positions, model.mesh.indices).with_material(material);
        mesh.validate()?;

        log::debug!(
            "OBJ model '{}': {} vertices, {} triangles",
            model.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        meshes.push(mesh);
    }

    Ok(meshes)
}
