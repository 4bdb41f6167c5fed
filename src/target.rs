use crate::error::{TracerError, TracerResult};

/// Bytes per accumulated pixel (`vec4<f32>`).
const ACCUMULATION_TEXEL_SIZE: u64 = 16;

/// Creates and frees render targets. Implemented by [`wgpu::Device`].
pub trait TargetAllocator {
    type Target;

    fn allocate(&self, width: u32, height: u32) -> TracerResult<Self::Target>;
    fn release(&self, target: Self::Target);
}

/// GPU storage behind one viewport: the kernel's raw sample and the running
/// mean it is blended into.
pub struct RenderTarget {
    pub sample: wgpu::Texture,
    pub sample_view: wgpu::TextureView,
    pub accumulation: wgpu::Buffer,
    pub width: u32,
    pub height: u32,
}

impl TargetAllocator for wgpu::Device {
    type Target = RenderTarget;

    fn allocate(&self, width: u32, height: u32) -> TracerResult<RenderTarget> {
        if width == 0 || height == 0 {
            return Err(TracerError::TargetAllocation {
                width,
                height,
                reason: "zero-sized viewport".to_owned(),
            });
        }

        self.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.push_error_scope(wgpu::ErrorFilter::Validation);

        let sample = self.create_texture(&wgpu::TextureDescriptor {
            label: Some("raw sample"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let sample_view = sample.create_view(&wgpu::TextureViewDescriptor::default());
        let accumulation = self.create_buffer(&wgpu::BufferDescriptor {
            label: Some("accumulation"),
            size: width as u64 * height as u64 * ACCUMULATION_TEXEL_SIZE,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let validation = pollster::block_on(self.pop_error_scope());
        let out_of_memory = pollster::block_on(self.pop_error_scope());
        if let Some(error) = out_of_memory.or(validation) {
            sample.destroy();
            accumulation.destroy();
            return Err(TracerError::TargetAllocation {
                width,
                height,
                reason: error.to_string(),
            });
        }

        Ok(RenderTarget {
            sample,
            sample_view,
            accumulation,
            width,
            height,
        })
    }

    fn release(&self, target: RenderTarget) {
        target.sample.destroy();
        target.accumulation.destroy();
    }
}

struct Allocated<T> {
    target: T,
    width: u32,
    height: u32,
}

/// Keeps exactly one target matching the viewport.
pub struct RenderTargetManager<T> {
    current: Option<Allocated<T>>,
}

impl<T> Default for RenderTargetManager<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T> RenderTargetManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current target, reallocated when missing or sized differently.
    /// The flag is true when a new target was made.
    ///
    /// The old target is released before the new one is requested. On
    /// failure the manager is left empty and the next call tries again.
    pub fn ensure<A>(&mut self, allocator: &A, width: u32, height: u32) -> TracerResult<(&T, bool)>
    where
        A: TargetAllocator<Target = T>,
    {
        let matches = matches!(
            &self.current,
            Some(current) if current.width == width && current.height == height
        );

        let resized = !matches;
        if resized {
            if let Some(previous) = self.current.take() {
                allocator.release(previous.target);
            }
            let target = allocator.allocate(width, height)?;
            tracing::info!("allocated {width}x{height} render target");
            self.current = Some(Allocated {
                target,
                width,
                height,
            });
        }

        self.current
            .as_ref()
            .map(|current| (&current.target, resized))
            .ok_or_else(|| TracerError::TargetAllocation {
                width,
                height,
                reason: "no render target".to_owned(),
            })
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref().map(|current| &current.target)
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.current
            .as_ref()
            .map(|current| (current.width, current.height))
    }

    pub fn release<A>(&mut self, allocator: &A)
    where
        A: TargetAllocator<Target = T>,
    {
        if let Some(previous) = self.current.take() {
            allocator.release(previous.target);
        }
    }
}
