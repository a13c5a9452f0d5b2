//! Trace a grid of rays through a BVH and print a depth preview.
//!
//! Builds a BVH over a procedural height field (or the first mesh of an OBJ
//! file passed on the command line), traces one orthographic ray per cell on
//! the rayon pool, then animates the mesh a few frames with refit.
//!
//! ```text
//! RUST_LOG=info cargo run --example trace_grid -- [model.obj]
//! ```

use anyhow::{Context, Result};
use lumen_bvh::{Bvh, BvhConfig, Mat4, Ray, Vec3};
use lumen_core::{load_obj, Mesh};
use std::time::Instant;

const WIDTH: usize = 64;
const HEIGHT: usize = 32;
const SHADES: &[u8] = b"@%#*+=-:. ";

fn main() -> Result<()> {
    env_logger::init();

    let mesh = match std::env::args().nth(1) {
        Some(path) => load_obj(&path)
            .with_context(|| format!("Failed to load {}", path))?
            .into_iter()
            .next()
            .with_context(|| format!("{} contains no meshes", path))?,
        None => height_field(48),
    };
    println!("Mesh: {} triangles, {} vertices", mesh.triangle_count(), mesh.vertex_count());

    let config = BvhConfig::from_json(r#"{ "bins": 8, "leaf_size": 2 }"#)?;
    let start = Instant::now();
    let mut bvh = Bvh::from_mesh(&mesh, &config)?;
    let stats = bvh.stats();
    println!(
        "Built in {:?}: {} nodes, {} leaves, depth {}, SAH {:.2}",
        start.elapsed(),
        stats.nodes,
        stats.leaves,
        stats.max_depth,
        stats.sah_cost
    );

    print_frame(&bvh);

    for frame in 1..=3 {
        let angle = frame as f32 * 0.15;
        let posed = mesh.transformed(&Mat4::from_rotation_z(angle));
        let start = Instant::now();
        bvh.update_from_mesh(&posed)?;
        println!("Frame {}: refit in {:?}", frame, start.elapsed());
        print_frame(&bvh);
    }

    Ok(())
}

/// A rippled square in the XY plane, two triangles per cell.
fn height_field(n: usize) -> Mesh {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let x = i as f32 / n as f32 * 2.0 - 1.0;
            let y = j as f32 / n as f32 * 2.0 - 1.0;
            let r = (x * x + y * y).sqrt();
            positions.push(Vec3::new(x, y, 0.2 * (r * 8.0).cos() * (1.0 - r).max(0.0)));
        }
    }

    let mut indices = Vec::with_capacity(n * n * 6);
    let row = (n + 1) as u32;
    for j in 0..n as u32 {
        for i in 0..n as u32 {
            let a = j * row + i;
            indices.extend_from_slice(&[a, a + 1, a + row, a + 1, a + row + 1, a + row]);
        }
    }
    Mesh::new(positions, indices)
}

/// Trace one ray per character cell straight down -Z and print hit depth.
fn print_frame(bvh: &Bvh) {
    let bounds = bvh.bounds();
    if bounds.is_empty() {
        println!("(empty)");
        return;
    }
    let extent = bounds.extent();
    let eye_z = bounds.max.z + 1.0;

    let mut rays: Vec<Ray> = (0..WIDTH * HEIGHT)
        .map(|i| {
            let u = ((i % WIDTH) as f32 + 0.5) / WIDTH as f32;
            let v = 1.0 - ((i / WIDTH) as f32 + 0.5) / HEIGHT as f32;
            let origin = Vec3::new(bounds.min.x + u * extent.x, bounds.min.y + v * extent.y, eye_z);
            Ray::new(origin, Vec3::NEG_Z)
        })
        .collect();

    let start = Instant::now();
    let records = bvh.intersect_batch(&mut rays);
    let elapsed = start.elapsed();

    let depth_range = (extent.z + 1.0).max(f32::EPSILON);
    let mut hits = 0;
    for row in records.chunks(WIDTH) {
        let line: String = row
            .iter()
            .map(|rec| {
                if !rec.did_hit {
                    return ' ';
                }
                hits += 1;
                let shade = ((rec.t - 1.0) / depth_range * (SHADES.len() - 1) as f32) as usize;
                SHADES[shade.min(SHADES.len() - 2)] as char
            })
            .collect();
        println!("|{}|", line);
    }
    println!("{} / {} rays hit in {:?}", hits, rays.len(), elapsed);
}
