//! Frame resources: color target + depth target, recreated only on resize.

use wgpu::TextureView;

use crate::config::OutlineConfig;

pub struct FrameResources {
    pub color: wgpu::Texture,
    pub depth: wgpu::Texture,
    width: u32,
    height: u32,
}

impl FrameResources {
    pub fn ensure_size(
        device: &wgpu::Device,
        existing: Option<Self>,
        config: &OutlineConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("FrameResources: width and height must be > 0".to_string());
        }
        if let Some(r) = existing {
            if r.width == width && r.height == height { return Ok(r); }
        }
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("outline_color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("outline_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Ok(Self { color, depth, width, height })
    }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn color_view(&self) -> TextureView { self.color.create_view(&Default::default()) }
    pub fn depth_view(&self) -> TextureView { self.depth.create_view(&Default::default()) }
}
