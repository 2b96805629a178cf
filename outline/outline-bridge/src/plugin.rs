//! Outline plugin: implements RenderBackend for the host.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use outline_renderer::{MeshDraw, Renderer};
use outline_tools::{validate_topology, SmoothOptions};
use render_api::{ExtractedMesh, ExtractedMeshes, ExtractedView, RenderBackend};

use crate::cache::BakeState;
use crate::config::BridgeConfig;

/// GPU buffers for one mesh.
struct GpuMesh {
    vertex_buf: Arc<wgpu::Buffer>,
    smoothed_normal_buf: Option<Arc<wgpu::Buffer>>,
    index_buf: Arc<wgpu::Buffer>,
    index_count: u32,
}

struct CachedMesh {
    state: BakeState,
    gpu: GpuMesh,
    transform: [f32; 16],
    visible: bool,
}

impl CachedMesh {
    fn draw(&self) -> MeshDraw {
        MeshDraw {
            vertex_buf: Arc::clone(&self.gpu.vertex_buf),
            smoothed_normal_buf: self.gpu.smoothed_normal_buf.clone(),
            index_buf: Arc::clone(&self.gpu.index_buf),
            index_count: self.gpu.index_count,
            transform: self.transform,
            outline: self.state.draw_material(),
        }
    }
}

/// Outline plugin: owns the wgpu device/queue and renderer; implements RenderBackend.
pub struct OutlinePlugin {
    renderer: Renderer,
    smoothing: SmoothOptions,
    /// Cache by entity_id. Updated in prepare() from ExtractedMeshes.
    mesh_cache: HashMap<u64, CachedMesh>,
}

impl OutlinePlugin {
    /// Create with wgpu device and queue (default config).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, BridgeConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: BridgeConfig) -> Result<Self, String> {
        let renderer = Renderer::new_with_config(device, queue, config.renderer)?;
        Ok(Self {
            renderer,
            smoothing: config.smoothing,
            mesh_cache: HashMap::new(),
        })
    }

    /// Create with a device from the default adapter, no surface. Blocks on adapter/device requests.
    pub fn new_headless(config: BridgeConfig) -> Result<Self, String> {
        let (device, queue) = pollster::block_on(request_device())?;
        Self::new_with_config(device, queue, config)
    }

    pub fn device(&self) -> &wgpu::Device {
        self.renderer.device()
    }
    pub fn queue(&self) -> &wgpu::Queue {
        self.renderer.queue()
    }
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Number of meshes currently cached with a baked smoothed-normal buffer.
    pub fn smoothed_mesh_count(&self) -> usize {
        self.mesh_cache.values().filter(|c| c.state.is_smoothed()).count()
    }

    /// RGBA8 pixels of the last rendered frame.
    pub fn read_frame(&self) -> Result<Vec<u8>, String> {
        self.renderer.read_color_target()
    }

    fn upload(&self, entity_id: u64, mesh: &ExtractedMesh) -> GpuMesh {
        let device = self.renderer.device();
        let queue = self.renderer.queue();
        let vertex_data = interleave_position_normal(&mesh.positions, &mesh.normals);
        let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("outline_mesh_vertex"),
            size: (vertex_data.len() * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buf, 0, bytemuck::cast_slice(&vertex_data));
        let index_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("outline_mesh_index"),
            size: (mesh.indices.len() * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buf, 0, bytemuck::cast_slice(&mesh.indices));
        log::debug!(
            "outline plugin: uploaded entity {} ({} vertices, {} triangles)",
            entity_id,
            mesh.positions.len(),
            mesh.indices.len() / 3
        );
        GpuMesh {
            vertex_buf: Arc::new(vertex_buf),
            smoothed_normal_buf: None,
            index_buf: Arc::new(index_buf),
            index_count: mesh.indices.len() as u32,
        }
    }

    fn upload_smoothed_normals(&self, normals: &[[f32; 3]]) -> Arc<wgpu::Buffer> {
        let buf = self.renderer.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("outline_mesh_smoothed_normals"),
            size: (normals.len() * 12) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.renderer.queue().write_buffer(&buf, 0, bytemuck::cast_slice(normals));
        Arc::new(buf)
    }
}

impl RenderBackend for OutlinePlugin {
    fn prepare(&mut self, extracted: &ExtractedMeshes) {
        let current_entities: HashSet<u64> = extracted.meshes.keys().copied().collect();
        self.mesh_cache.retain(|k, _| current_entities.contains(k));
        for (&entity_id, mesh) in &extracted.meshes {
            if !mesh.visible {
                if let Some(cached) = self.mesh_cache.get_mut(&entity_id) {
                    cached.visible = false;
                }
                continue;
            }
            if mesh.positions.is_empty() || mesh.indices.is_empty() {
                self.mesh_cache.remove(&entity_id);
                continue;
            }
            if let Err(e) = check_extracted(mesh) {
                log::warn!("outline plugin: skipping entity {}: {}", entity_id, e);
                self.mesh_cache.remove(&entity_id);
                continue;
            }
            let (previous_state, previous_gpu) = match self.mesh_cache.remove(&entity_id) {
                Some(cached) => (Some(cached.state), Some(cached.gpu)),
                None => (None, None),
            };
            let (state, outcome) = BakeState::prepare(previous_state, entity_id, mesh, &self.smoothing);
            let mut gpu = match previous_gpu {
                Some(gpu) if !outcome.upload => gpu,
                _ => self.upload(entity_id, mesh),
            };
            if let Some(normals) = outcome.smoothed_normals {
                gpu.smoothed_normal_buf = Some(self.upload_smoothed_normals(&normals));
            }
            self.mesh_cache.insert(
                entity_id,
                CachedMesh {
                    state,
                    gpu,
                    transform: mesh.transform,
                    visible: true,
                },
            );
        }
    }

    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String> {
        let meshes: Vec<MeshDraw> = self
            .mesh_cache
            .values()
            .filter(|c| c.visible)
            .map(CachedMesh::draw)
            .collect();
        let (width, height) = view.viewport_size;
        let device = self.renderer.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("outline_plugin_frame"),
        });
        self.renderer.encode_frame(&mut encoder, width, height, &view.view_proj, &meshes)?;
        let cmd = encoder.finish();
        self.renderer.submit([cmd]);
        Ok(())
    }
}

async fn request_device() -> Result<(wgpu::Device, wgpu::Queue), String> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok_or("new_headless: no adapter")?;
    adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await
        .map_err(|e| format!("new_headless: request_device: {}", e))
}

/// Geometry checks done before anything reaches the GPU.
fn check_extracted(mesh: &ExtractedMesh) -> Result<(), String> {
    if !mesh.normals.is_empty() && mesh.normals.len() != mesh.positions.len() {
        return Err(format!(
            "{} normals for {} positions",
            mesh.normals.len(),
            mesh.positions.len()
        ));
    }
    validate_topology(mesh.positions.len(), &mesh.indices).map_err(|e| e.to_string())
}

/// Position + normal, 6 f32 per vertex. Missing normals are written as zero.
fn interleave_position_normal(positions: &[[f32; 3]], normals: &[[f32; 3]]) -> Vec<f32> {
    let mut out = Vec::with_capacity(positions.len() * 6);
    for (i, p) in positions.iter().enumerate() {
        out.extend_from_slice(p);
        out.extend_from_slice(normals.get(i).unwrap_or(&[0.0; 3]));
    }
    out
}
