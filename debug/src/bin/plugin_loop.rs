//! Host loop: use render_api types and OutlinePlugin as RenderBackend (prepare + render_frame).
//! Runs a few frames so the geometry cache and the one-time smoothing bake are exercised.

use std::collections::HashMap;

use outline_bridge::OutlinePlugin;
use render_api::{ExtractedMesh, ExtractedMeshes, ExtractedView, OutlineMaterial, RenderBackend, IDENTITY};

fn main() -> Result<(), String> {
    env_logger::init();
    let (device, queue) = pollster::block_on(request_device())?;
    let mut backend: Box<dyn RenderBackend> = Box::new(OutlinePlugin::new(device, queue)?);

    // One triangle, split into two coincident copies of its first vertex to give the smoother a seam.
    let positions = vec![[0.0f32, 0.5, 0.0], [-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]];
    let normals = vec![[0.0f32, 0.0, 1.0]; 4];
    let mut meshes = HashMap::new();
    meshes.insert(
        1u64,
        ExtractedMesh {
            entity_id: 1,
            positions,
            normals,
            indices: vec![0, 1, 2, 3, 1, 2],
            transform: IDENTITY,
            visible: true,
            outline: Some(OutlineMaterial {
                thickness: 0.05,
                use_smoothed_normals: true,
                ..Default::default()
            }),
        },
    );
    let extracted = ExtractedMeshes { meshes };
    let view = ExtractedView {
        view_proj: IDENTITY,
        viewport_size: (800, 600),
    };

    for frame in 0..3 {
        backend.prepare(&extracted);
        backend.render_frame(&view)?;
        log::info!("plugin_loop: frame {} OK", frame);
    }
    println!("plugin_loop: 3 frames OK");
    Ok(())
}

async fn request_device() -> Result<(wgpu::Device, wgpu::Queue), String> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok_or("No adapter")?;
    adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await
        .map_err(|e| format!("No device: {}", e))
}
