//! Outline pass: back-face extrusion. Front faces are culled, the remaining back faces are
//! pushed out along the raw or precomputed smoothed normal and filled with a flat color.
//! Loads (does not clear) the color and depth written by the base pass.

use std::sync::Arc;
use wgpu::CommandEncoder;

use render_api::OutlineMaterial;

use crate::config::OutlineConfig;
use crate::resources::FrameResources;
use crate::vertex_stage::OutlineUniforms;

const OUTLINE_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/outline.wgsl"));

/// Interleaved position + normal, 6 f32 per vertex.
pub const VERTEX_STRIDE: u64 = 24;
/// Smoothed normal channel, 3 f32 per vertex.
pub const SMOOTHED_NORMAL_STRIDE: u64 = 12;

const POSITION_NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
];

const SMOOTHED_NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [
    wgpu::VertexAttribute { offset: 0, shader_location: 2, format: wgpu::VertexFormat::Float32x3 },
];

pub(crate) fn position_normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: VERTEX_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_NORMAL_ATTRIBUTES,
    }
}

fn smoothed_normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: SMOOTHED_NORMAL_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &SMOOTHED_NORMAL_ATTRIBUTES,
    }
}

/// Rasterizer state of the outline: only back faces survive.
pub fn outline_primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Front),
        ..Default::default()
    }
}

#[derive(Clone)]
pub struct MeshDraw {
    /// Position + normal, stride [`VERTEX_STRIDE`].
    pub vertex_buf: Arc<wgpu::Buffer>,
    /// Smoothed normals, stride [`SMOOTHED_NORMAL_STRIDE`]. Only present when baked.
    pub smoothed_normal_buf: Option<Arc<wgpu::Buffer>>,
    pub index_buf: Arc<wgpu::Buffer>,
    pub index_count: u32,
    /// World transform (column-major 4x4). Use identity for model-space geometry.
    pub transform: [f32; 16],
    /// `None` skips the outline for this mesh (base pass still draws it).
    pub outline: Option<OutlineMaterial>,
}

pub struct OutlinePass {
    raw_pipeline: wgpu::RenderPipeline,
    smoothed_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    view_proj_buf: wgpu::Buffer,
    reversed_z: bool,
}

impl OutlinePass {
    pub fn new(device: &wgpu::Device, config: &OutlineConfig) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("outline_shader"),
            source: wgpu::ShaderSource::Wgsl(OUTLINE_SHADER.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("outline_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<OutlineUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("outline_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let raw_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            config,
            "outline_raw_pipeline",
            "vs_raw",
            &[position_normal_layout()],
        );
        let smoothed_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            config,
            "outline_smoothed_pipeline",
            "vs_smoothed",
            &[position_normal_layout(), smoothed_normal_layout()],
        );
        let view_proj_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("outline_view_proj"),
            size: 64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Self {
            raw_pipeline,
            smoothed_pipeline,
            bind_group_layout,
            view_proj_buf,
            reversed_z: config.reversed_z,
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
            label: Some("outline_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        let w = frame.width() as f32;
        let h = frame.height() as f32;
        rp.set_viewport(0.0, 0.0, w, h, 0.0, 1.0);
        for mesh in meshes {
            let Some(material) = mesh.outline.as_ref() else {
                continue;
            };
            let smoothed = match (&mesh.smoothed_normal_buf, material.use_smoothed_normals) {
                (Some(buf), true) => Some(buf),
                (None, true) => {
                    log::warn!("outline_pass: mesh has no smoothed normals, extruding along raw normals");
                    None
                }
                _ => None,
            };
            let uniforms = OutlineUniforms::from_material(material, self.reversed_z);
            let model_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("outline_model"),
                size: 64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&model_buf, 0, bytemuck::cast_slice(&mesh.transform));
            let outline_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("outline_params"),
                size: std::mem::size_of::<OutlineUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&outline_buf, 0, bytemuck::bytes_of(&uniforms));
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("outline_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: self.view_proj_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: model_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: outline_buf.as_entire_binding() },
                ],
            });
            match smoothed {
                Some(buf) => {
                    rp.set_pipeline(&self.smoothed_pipeline);
                    rp.set_vertex_buffer(1, buf.slice(..));
                }
                None => rp.set_pipeline(&self.raw_pipeline),
            }
            rp.set_bind_group(0, &bind_group, &[]);
            rp.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            rp.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        drop(rp);
        Ok(())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    config: &OutlineConfig,
    label: &str,
    vertex_entry: &str,
    buffers: &[wgpu::VertexBufferLayout],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: outline_primitive_state(),
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
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("parse wgsl");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::default(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("validate wgsl");
        module
    }

    #[test]
    fn outline_shader_validates() {
        let module = validate(OUTLINE_SHADER);
        let entries: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        for name in ["vs_raw", "vs_smoothed", "fs"] {
            assert!(entries.contains(&name), "missing entry point {}", name);
        }
    }

    #[test]
    fn outline_uniform_struct_matches_rust_layout() {
        let module = validate(OUTLINE_SHADER);
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, t)| t.name.as_deref() == Some("Outline"))
            .expect("Outline struct");
        let size = ty.inner.size(module.to_ctx());
        assert_eq!(size as usize, std::mem::size_of::<OutlineUniforms>());
    }

    #[test]
    fn outline_culls_front_faces() {
        let state = outline_primitive_state();
        assert_eq!(state.cull_mode, Some(wgpu::Face::Front));
        assert_eq!(state.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(state.topology, wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn vertex_layouts_match_strides() {
        let layout = position_normal_layout();
        assert_eq!(layout.array_stride, VERTEX_STRIDE);
        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset + last.format.size(), VERTEX_STRIDE);
        let smoothed = smoothed_normal_layout();
        assert_eq!(smoothed.attributes[0].shader_location, 2);
        assert_eq!(smoothed.attributes[0].format.size(), SMOOTHED_NORMAL_STRIDE);
    }
}
