//! Headless outline render to PNG: a hard-edged cube and a UV sphere, each drawn twice, once
//! extruded along raw normals (top row) and once along baked smoothed normals (bottom row).
//! Run from repo root: cargo run -p debug --bin headless_outline -- [out.png] [thickness]

use std::collections::HashMap;

use outline_bridge::{BridgeConfig, OutlinePlugin};
use outline_renderer::vertex_stage::mul_mat4;
use outline_tools::{hard_edged_cube, uv_sphere, MeshData};
use render_api::{ExtractedMesh, ExtractedMeshes, ExtractedView, OutlineMaterial, RenderBackend, IDENTITY};

const WIDTH: u32 = 960;
const HEIGHT: u32 = 720;

fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
    let f = 1.0 / (fov_y * 0.5).tan();
    let range = far / (near - far);
    [
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, range, -1.0,
        0.0, 0.0, range * near, 0.0,
    ]
}

fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    let mut m = IDENTITY;
    m[12] = x;
    m[13] = y;
    m[14] = z;
    m
}

/// Rotation about Y then X, so the cube shows three faces.
fn tilt(yaw: f32, pitch: f32) -> [f32; 16] {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let ry = [cy, 0.0, -sy, 0.0, 0.0, 1.0, 0.0, 0.0, sy, 0.0, cy, 0.0, 0.0, 0.0, 0.0, 1.0];
    let rx = [1.0, 0.0, 0.0, 0.0, 0.0, cp, sp, 0.0, 0.0, -sp, cp, 0.0, 0.0, 0.0, 0.0, 1.0];
    mul_mat4(&rx, &ry)
}

fn extracted(entity_id: u64, mesh: &MeshData, transform: [f32; 16], outline: OutlineMaterial) -> ExtractedMesh {
    ExtractedMesh {
        entity_id,
        positions: mesh.positions.clone(),
        normals: mesh.normals.clone(),
        indices: mesh.indices.clone(),
        transform,
        visible: true,
        outline: Some(outline),
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let out_path = args.get(1).map(String::as_str).unwrap_or("outline.png");
    let thickness: f32 = match args.get(2) {
        Some(s) => s.parse().map_err(|e| format!("bad thickness {:?}: {}", s, e))?,
        None => 0.06,
    };

    let mut plugin = OutlinePlugin::new_headless(BridgeConfig::default())?;
    let cube = hard_edged_cube(0.5);
    let sphere = uv_sphere(0.6, 16, 32);
    let raw = OutlineMaterial {
        thickness,
        color: [1.0, 0.55, 0.1, 1.0],
        depth_offset: 0.0,
        use_smoothed_normals: false,
    };
    let smoothed = OutlineMaterial {
        use_smoothed_normals: true,
        ..raw
    };
    let rot = tilt(0.6, 0.45);
    let mut meshes = HashMap::new();
    for (id, mesh, x, y, material) in [
        (1u64, &cube, -1.1, 0.85, raw),
        (2, &sphere, 1.1, 0.85, raw),
        (3, &cube, -1.1, -0.85, smoothed),
        (4, &sphere, 1.1, -0.85, smoothed),
    ] {
        let transform = mul_mat4(&translation(x, y, 0.0), &rot);
        meshes.insert(id, extracted(id, mesh, transform, material));
    }
    let extracted = ExtractedMeshes { meshes };

    let proj = perspective(0.9, WIDTH as f32 / HEIGHT as f32, 0.1, 50.0);
    let view = ExtractedView {
        view_proj: mul_mat4(&proj, &translation(0.0, 0.0, -5.0)),
        viewport_size: (WIDTH, HEIGHT),
    };

    plugin.prepare(&extracted);
    log::info!("headless_outline: {} meshes with smoothed normals", plugin.smoothed_mesh_count());
    plugin.render_frame(&view)?;
    let pixels = plugin.read_frame()?;
    let img = image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels).ok_or("readback size mismatch")?;
    img.save(out_path).map_err(|e| format!("save {}: {}", out_path, e))?;
    println!("headless_outline: wrote {}", out_path);
    Ok(())
}
