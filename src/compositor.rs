use bytemuck::{Pod, Zeroable};

use crate::{
    kernel::workgroup_count,
    renderer::{IndexBuffer, Vertex, VertexBuffer, QUAD_INDICES, QUAD_VERTICES},
    target::RenderTarget,
};

/// Mirrors `BlendParams` in `accumulate.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct BlendParams {
    weight: f32,
    width: u32,
    height: u32,
    _pad: u32,
}

/// Mirrors `Viewport` in `present.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct Viewport {
    width: u32,
    height: u32,
    _pad: [u32; 2],
}

/// Bind groups tied to one render target.
pub struct CompositorBindings {
    blend: wgpu::BindGroup,
    present: wgpu::BindGroup,
}

/// Folds each raw sample into the running mean, then draws the mean.
pub struct Compositor {
    blend_pipeline: wgpu::ComputePipeline,
    blend_layout: wgpu::BindGroupLayout,
    blend_params: wgpu::Buffer,
    present_pipeline: wgpu::RenderPipeline,
    present_layout: wgpu::BindGroupLayout,
    viewport: wgpu::Buffer,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl Compositor {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let blend_shader =
            device.create_shader_module(wgpu::include_wgsl!("asset/shader/accumulate.wgsl"));
        let present_shader =
            device.create_shader_module(wgpu::include_wgsl!("asset/shader/present.wgsl"));

        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blend_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                storage_entry(2, wgpu::ShaderStages::COMPUTE, false),
            ],
        });

        let blend_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blend Pipeline Layout"),
            bind_group_layouts: &[&blend_layout],
            push_constant_ranges: &[],
        });

        let blend_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Blend Pipeline"),
            layout: Some(&blend_pipeline_layout),
            module: &blend_shader,
            entry_point: "main",
        });

        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("present_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                storage_entry(1, wgpu::ShaderStages::FRAGMENT, true),
            ],
        });

        let present_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Present Pipeline Layout"),
                bind_group_layouts: &[&present_layout],
                push_constant_ranges: &[],
            });

        let present_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&present_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &present_shader,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &present_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let blend_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blend params"),
            size: std::mem::size_of::<BlendParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("present viewport"),
            size: std::mem::size_of::<Viewport>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            blend_pipeline,
            blend_layout,
            blend_params,
            present_pipeline,
            present_layout,
            viewport,
            vertex_buffer: VertexBuffer::init_immediate(device, QUAD_VERTICES, Some("Quad Vertices")),
            index_buffer: IndexBuffer::init_immediate_u16(device, QUAD_INDICES, Some("Quad Indices")),
        }
    }

    pub fn release(self) {
        self.blend_params.destroy();
        self.viewport.destroy();
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }

    pub fn bind(&self, device: &wgpu::Device, target: &RenderTarget) -> CompositorBindings {
        let blend = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blend_bind_group"),
            layout: &self.blend_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.blend_params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.sample_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: target.accumulation.as_entire_binding(),
                },
            ],
        });
        let present = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("present_bind_group"),
            layout: &self.present_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.viewport.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: target.accumulation.as_entire_binding(),
                },
            ],
        });
        CompositorBindings { blend, present }
    }

    /// `accumulated = mix(accumulated, sample, weight)` for every pixel.
    pub fn blend(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &CompositorBindings,
        weight: f32,
        width: u32,
        height: u32,
    ) {
        let params = BlendParams {
            weight,
            width,
            height,
            _pad: 0,
        };
        queue.write_buffer(&self.blend_params, 0, bytemuck::bytes_of(&params));

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Blend Pass"),
        });
        pass.set_pipeline(&self.blend_pipeline);
        pass.set_bind_group(0, &bindings.blend, &[]);
        pass.dispatch_workgroups(workgroup_count(width), workgroup_count(height), 1);
    }

    /// Draw the running mean into `view`.
    pub fn present(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &CompositorBindings,
        view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let viewport = Viewport {
            width,
            height,
            _pad: [0; 2],
        };
        queue.write_buffer(&self.viewport, 0, bytemuck::bytes_of(&viewport));

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });

        render_pass.set_pipeline(&self.present_pipeline);
        render_pass.set_bind_group(0, &bindings.present, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.buffer().slice(..));
        render_pass.set_index_buffer(
            self.index_buffer.buffer().slice(..),
            self.index_buffer.format(),
        );
        render_pass.draw_indexed(0..self.index_buffer.count(), 0, 0..1);
    }
}
