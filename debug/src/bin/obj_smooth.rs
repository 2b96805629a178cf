//! OBJ smoothing report: load an OBJ, bake cospatial smoothed normals per model and print
//! cluster stats plus how far the smoothed normals moved from the authored ones.
//! Run from repo root: cargo run -p debug --bin obj_smooth -- model.obj [epsilon]

use std::path::Path;

use outline_tools::geometry::angle_between;
use outline_tools::{bake_smoothed_normals, ClusterStrategy, MeshData, SmoothOptions, DEFAULT_COSPATIAL_EPSILON};

fn load_obj_meshes(obj_path: &Path) -> Result<Vec<(String, MeshData)>, String> {
    let (models, _) = tobj::load_obj(obj_path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| format!("load_obj: {:?}", e))?;
    models
        .into_iter()
        .map(|m| {
            let positions: Vec<f32> = m.mesh.positions.iter().map(|&x| x as f32).collect();
            let normals: Vec<f32> = m.mesh.normals.iter().map(|&x| x as f32).collect();
            let mesh = MeshData::from_flat(&positions, &normals, m.mesh.indices).map_err(|e| e.to_string())?;
            Ok((m.name, mesh))
        })
        .collect()
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let obj_path = args
        .get(1)
        .ok_or("usage: obj_smooth <model.obj> [epsilon]")?;
    let epsilon: f32 = match args.get(2) {
        Some(s) => s.parse().map_err(|e| format!("bad epsilon {:?}: {}", s, e))?,
        None => DEFAULT_COSPATIAL_EPSILON,
    };
    let options = SmoothOptions {
        epsilon,
        strategy: ClusterStrategy::Grid,
        ..Default::default()
    };

    let meshes = load_obj_meshes(Path::new(obj_path))?;
    if meshes.is_empty() {
        return Err(format!("{}: no models", obj_path));
    }
    for (name, mut mesh) in meshes {
        let report = bake_smoothed_normals(&mut mesh, &options).map_err(|e| format!("{}: {}", name, e))?;
        let smoothed = mesh.channel(options.channel).unwrap_or(&[]);
        let max_deviation = mesh
            .normals
            .iter()
            .zip(smoothed)
            .map(|(n, s)| angle_between(*n, *s))
            .fold(0.0f32, f32::max);
        println!(
            "{}: {} vertices, {} triangles -> {} clusters (welded {}), skipped {} degenerate, {} empty, max normal change {:.1} deg",
            name,
            report.vertex_count,
            report.triangle_count,
            report.cluster_count,
            report.vertex_count - report.cluster_count,
            report.skipped_triangles,
            report.empty_clusters,
            max_deviation.to_degrees()
        );
    }
    Ok(())
}
