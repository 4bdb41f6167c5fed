use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::{renderer::SceneUpload, scene::GpuSphere, target::RenderTarget};

/// Must match `@workgroup_size` in the shaders.
pub const WORKGROUP_SIZE: u32 = 8;

/// Per-dispatch inputs, mirrors `Params` in `trace.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct KernelParams {
    pub camera_to_world: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    /// Direction in `xyz`, intensity in `w`.
    pub directional_light: [f32; 4],
    /// Sub-pixel jitter in [0, 1).
    pub pixel_offset: [f32; 2],
    pub max_bounces: u32,
    /// Zero disables the sphere buffer.
    pub sphere_count: u32,
}

pub fn workgroup_count(pixels: u32) -> u32 {
    (pixels + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE
}

/// Compute pipeline writing one noisy radiance sample per pixel.
pub struct TracingKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
    // Stands in for the sphere buffer when the scene is empty.
    placeholder: wgpu::Buffer,
}

impl TracingKernel {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("asset/shader/trace.wgsl"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trace_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trace Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Trace Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trace params"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let placeholder = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("empty scene"),
            contents: bytemuck::bytes_of(&GpuSphere::zeroed()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            pipeline,
            bind_group_layout,
            params,
            placeholder,
        }
    }

    pub fn bind(
        &self,
        device: &wgpu::Device,
        scene: &SceneUpload,
        skybox: &wgpu::TextureView,
        target: &RenderTarget,
    ) -> wgpu::BindGroup {
        let (spheres, _) = self.scene_input(scene);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: spheres.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(skybox),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&target.sample_view),
                },
            ],
        })
    }

    /// Sphere buffer and record count the next dispatch will see.
    pub fn scene_input<'a>(&'a self, scene: &'a SceneUpload) -> (&'a wgpu::Buffer, u32) {
        scene.input(&self.placeholder)
    }

    pub fn release(self) {
        self.params.destroy();
        self.placeholder.destroy();
    }

    /// Upload `params` and record the trace pass. Fire and forget.
    pub fn dispatch(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &wgpu::BindGroup,
        params: &KernelParams,
        width: u32,
        height: u32,
    ) {
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(params));

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Trace Pass"),
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroup_count(width), workgroup_count(height), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 160);
    }

    #[test]
    fn workgroups_cover_partial_tiles() {
        assert_eq!(workgroup_count(8), 1);
        assert_eq!(workgroup_count(9), 2);
        assert_eq!(workgroup_count(1920), 240);
        assert_eq!(workgroup_count(1), 1);
    }
}
