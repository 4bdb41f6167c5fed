use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Clip-space quad covering the viewport.
pub const QUAD_VERTICES: &[Vertex] = &[
    Vertex { position: [-1.0, -1.0] },
    Vertex { position: [1.0, -1.0] },
    Vertex { position: [1.0, 1.0] },
    Vertex { position: [-1.0, 1.0] },
];

pub const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

pub struct VertexBuffer(wgpu::Buffer);

impl VertexBuffer {
    pub fn init_immediate(device: &wgpu::Device, vertices: &[Vertex], label: Option<&str>) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self(buffer)
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn destroy(self) {
        self.0.destroy();
    }
}

pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    pub fn init_immediate_u16(device: &wgpu::Device, indices: &[u16], label: Option<&str>) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            buffer,
            count: indices.len() as u32,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn format(&self) -> wgpu::IndexFormat {
        wgpu::IndexFormat::Uint16
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn destroy(self) {
        self.buffer.destroy();
    }
}

/// Storage buffer holding the scene records, or nothing for an empty scene.
pub struct SceneUpload {
    buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl SceneUpload {
    pub fn empty() -> Self {
        Self {
            buffer: None,
            count: 0,
        }
    }

    /// Drop the previous records and upload `records`.
    pub fn replace<T: bytemuck::Pod>(&mut self, device: &wgpu::Device, records: Option<&[T]>) {
        self.release();
        if let Some(records) = records.filter(|records| !records.is_empty()) {
            self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene objects"),
                contents: bytemuck::cast_slice(records),
                usage: wgpu::BufferUsages::STORAGE,
            }));
            self.count = records.len() as u32;
        }
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Buffer to bind and the record count to report, falling back to
    /// `placeholder` and zero records when nothing is uploaded.
    pub fn input<'a>(&'a self, placeholder: &'a wgpu::Buffer) -> (&'a wgpu::Buffer, u32) {
        scene_input(self.buffer.as_ref(), self.count, placeholder)
    }

    pub fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.count = 0;
    }
}

/// A storage binding can never be left empty, so an empty scene binds
/// `fallback` and reports no records.
pub fn scene_input<'a, B>(uploaded: Option<&'a B>, count: u32, fallback: &'a B) -> (&'a B, u32) {
    match uploaded {
        Some(buffer) if count > 0 => (buffer, count),
        _ => (fallback, 0),
    }
}
