//! Base pass: unlit mesh in a constant color. Clears color + depth and writes the depth the
//! outline pass tests against.

use wgpu::CommandEncoder;

use crate::config::OutlineConfig;
use crate::outline_pass::{position_normal_layout, MeshDraw};
use crate::resources::FrameResources;

const BASE_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/base.wgsl"));

pub fn base_primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Back),
        ..Default::default()
    }
}

pub struct BasePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    view_proj_buf: wgpu::Buffer,
    base_color_buf: wgpu::Buffer,
    clear_color: wgpu::Color,
    depth_clear_value: f32,
}

impl BasePass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: &OutlineConfig) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("base_shader"),
            source: wgpu::ShaderSource::Wgsl(BASE_SHADER.into()),
        });
        let uniform_entry = |binding: u32, visibility: wgpu::ShaderStages, size: u64| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: std::num::NonZeroU64::new(size),
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("base_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX, 64),
                uniform_entry(1, wgpu::ShaderStages::VERTEX, 64),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT, 16),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("base_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("base_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[position_normal_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(config.color_format.into())],
                compilation_options: Default::default(),
            }),
            primitive: base_primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: config.depth_format,
                depth_write_enabled: true,
                depth_compare: config.depth_compare(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let view_proj_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("base_view_proj"),
            size: 64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let base_color_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("base_color"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&base_color_buf, 0, bytemuck::cast_slice(&config.base_color));
        Ok(Self {
            pipeline,
            bind_group_layout,
            view_proj_buf,
            base_color_buf,
            clear_color: config.clear_color,
            depth_clear_value: config.depth_clear_value(),
        })
    }

    pub fn encode(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &FrameResources,
        meshes: &[MeshDraw],
        view_proj: &[f32; 16],
    ) -> Result<(), String> {
        queue.write_buffer(&self.view_proj_buf, 0, bytemuck::cast_slice(view_proj));
        let color_view = frame.color_view();
        let depth_view = frame.depth_view();
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("base_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.depth_clear_value),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_viewport(0.0, 0.0, frame.width() as f32, frame.height() as f32, 0.0, 1.0);
        rp.set_pipeline(&self.pipeline);
        for mesh in meshes {
            let model_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("base_model"),
                size: 64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&model_buf, 0, bytemuck::cast_slice(&mesh.transform));
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("base_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: self.view_proj_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: model_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: self.base_color_buf.as_entire_binding() },
                ],
            });
            rp.set_bind_group(0, &bind_group, &[]);
            rp.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            rp.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        drop(rp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_shader_validates() {
        let module = naga::front::wgsl::parse_str(BASE_SHADER).expect("parse wgsl");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::default(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("validate wgsl");
        assert_eq!(module.entry_points.len(), 2);
    }

    #[test]
    fn base_and_outline_cull_opposite_faces() {
        let base = base_primitive_state();
        let outline = crate::outline_pass::outline_primitive_state();
        assert_eq!(base.front_face, outline.front_face);
        assert_eq!(base.cull_mode, Some(wgpu::Face::Back));
        assert_ne!(base.cull_mode, outline.cull_mode);
    }
}
