//! Outline renderer: wgpu unlit base pass + back-face extrusion outline pass.

pub mod base_pass;
pub mod config;
pub mod outline_pass;
pub mod resources;
pub mod vertex_stage;

pub use base_pass::BasePass;
pub use config::OutlineConfig;
pub use outline_pass::{outline_primitive_state, MeshDraw, OutlinePass, SMOOTHED_NORMAL_STRIDE, VERTEX_STRIDE};
pub use resources::FrameResources;
pub use vertex_stage::{outline_vertex, OutlineUniforms, VertexInput};

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: OutlineConfig,
    base_pass: BasePass,
    outline_pass: OutlinePass,
    frame_resources: Option<FrameResources>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, OutlineConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: OutlineConfig) -> Result<Self, String> {
        let base_pass = BasePass::new(&device, &queue, &config)?;
        let outline_pass = OutlinePass::new(&device, &config)?;
        log::debug!(
            "outline renderer: color {:?}, depth {:?}, reversed_z {}",
            config.color_format,
            config.depth_format,
            config.reversed_z
        );
        Ok(Self {
            device,
            queue,
            config,
            base_pass,
            outline_pass,
            frame_resources: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device { &self.device }
    pub fn queue(&self) -> &wgpu::Queue { &self.queue }
    pub fn config(&self) -> &OutlineConfig { &self.config }

    pub fn ensure_frame_resources(&mut self, width: u32, height: u32) -> Result<(), String> {
        let existing = self.frame_resources.take();
        let new_res = FrameResources::ensure_size(&self.device, existing, &self.config, width, height)?;
        self.frame_resources = Some(new_res);
        Ok(())
    }

    pub fn current_color_target(&self) -> Option<&wgpu::Texture> {
        self.frame_resources.as_ref().map(|f| &f.color)
    }

    /// Encode base + outline passes into the given encoder. Resizes frame resources if needed.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        width: u32,
        height: u32,
        view_proj: &[f32; 16],
        meshes: &[MeshDraw],
    ) -> Result<(), String> {
        self.ensure_frame_resources(width, height)?;
        let frame = self.frame_resources.as_ref().ok_or("encode_frame: no frame resources")?;
        self.base_pass.encode(encoder, &self.device, &self.queue, frame, meshes, view_proj)?;
        self.outline_pass.encode(encoder, &self.device, &self.queue, frame, meshes, view_proj)?;
        Ok(())
    }

    pub fn render_frame(
        &mut self,
        width: u32,
        height: u32,
        view_proj: &[f32; 16],
        meshes: &[MeshDraw],
    ) -> Result<wgpu::CommandBuffer, String> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("outline_frame") });
        self.encode_frame(&mut encoder, width, height, view_proj, meshes)?;
        Ok(encoder.finish())
    }

    pub fn submit(&self, command_buffers: impl IntoIterator<Item = wgpu::CommandBuffer>) {
        self.queue.submit(command_buffers);
    }

    /// Copy the color target back to the CPU as tightly packed rows (4 bytes per texel).
    /// Blocks until the GPU is done. Call after submitting a frame.
    pub fn read_color_target(&self) -> Result<Vec<u8>, String> {
        let frame = self.frame_resources.as_ref().ok_or("read_color_target: no frame (render a frame first)")?;
        let bytes_per_texel = self
            .config
            .color_format
            .block_copy_size(None)
            .ok_or("read_color_target: color format is not copyable")?;
        if bytes_per_texel != 4 {
            return Err(format!(
                "read_color_target: expected 4 bytes per texel, {:?} has {}",
                self.config.color_format, bytes_per_texel
            ));
        }
        let (width, height) = (frame.width(), frame.height());
        let unpadded_row = width * bytes_per_texel;
        let padded_row = padded_bytes_per_row(unpadded_row);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("outline_readback"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("outline_readback") });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &frame.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| "read_color_target: map callback dropped".to_string())?
            .map_err(|e| format!("read_color_target: map failed: {:?}", e))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_row * height) as usize);
        for row in data.chunks(padded_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_row as usize]);
        }
        drop(data);
        staging.unmap();
        Ok(pixels)
    }
}

/// Round a row size up to wgpu's buffer copy alignment.
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}
