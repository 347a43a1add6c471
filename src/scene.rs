//! Scene data models and GPU buffer upload.
//!
//! Host-side vertex and uniform structs, their GPU layouts, and the one-time
//! upload path that turns a [`crate::resources::Geometry`] into GPU-resident
//! buffers plus the bind group the render pipeline expects. Buffers are
//! created unmapped and filled through `queue.write_buffer`; the queue's
//! FIFO ordering makes the writes visible to every draw submitted later, so
//! no explicit flush or fence is needed.

use std::mem;

use crate::resources::Geometry;

/// One interleaved vertex: 2-D position and an RGB colour.
///
/// The attribute formats and offsets here must exactly match the shader's
/// declared input locations (0: position, 1: colour).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Uniform block at `@group(0) @binding(0)` of the scene shader.
///
/// Uniform buffers want 16-byte alignment, hence the trailing padding: the
/// driver reads the struct with WGSL layout rules and a mismatch is silent
/// garbage, not an error we could catch.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub color: [f32; 4],
    pub time: f32,
    pub _padding: [f32; 3],
}

/// Byte offset of the per-frame time scalar inside [`SceneUniforms`].
pub const UNIFORM_TIME_OFFSET: wgpu::BufferAddress =
    mem::offset_of!(SceneUniforms, time) as wgpu::BufferAddress;

impl SceneUniforms {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            time: 0.0,
            _padding: [0.0; 3],
        }
    }
}

/// Buffer size for `count` 16-bit indices, rounded up to the driver's copy
/// alignment (4 bytes). Seven indices are 14 bytes of payload but need a
/// 16-byte buffer.
pub fn index_buffer_size(count: usize) -> wgpu::BufferAddress {
    let payload = (count * mem::size_of::<u16>()) as wgpu::BufferAddress;
    payload.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT
}

/// Index buffer handle plus the index count the draw call needs.
#[derive(Debug)]
pub struct IndexResources {
    pub buffer: wgpu::Buffer,
    pub count: u32,
}

/// Uniform buffer handle plus the bind group that exposes it to the shader.
#[derive(Debug)]
pub struct UniformResources {
    pub bind_group: wgpu::BindGroup,
    pub buffer: wgpu::Buffer,
}

/// All GPU-resident scene data. Index and uniform resources are optional:
/// a scene without indices is drawn non-indexed, and a scene without
/// uniforms simply binds nothing at group 0.
#[derive(Debug)]
pub struct SceneResources {
    pub uniforms: Option<UniformResources>,
    pub index: Option<IndexResources>,
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

/// Bind-group layout for [`SceneUniforms`]: one uniform buffer visible to
/// both shader stages. Must stay in lockstep with the layout used when the
/// pipeline is built, or bind-group creation fails validation.
pub fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(mem::size_of::<SceneUniforms>() as u64),
            },
            count: None,
        }],
        label: Some("scene_uniform_layout"),
    })
}

impl SceneResources {
    /// Upload `geometry` and the initial uniform contents.
    ///
    /// Every buffer is created with a fixed size and `COPY_DST` usage, then
    /// filled with a queue-side write.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &Geometry,
        layout: &wgpu::BindGroupLayout,
        uniforms: SceneUniforms,
    ) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene vertex buffer"),
            size: (geometry.vertices.len() * mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&geometry.vertices));

        let index = (!geometry.indices.is_empty()).then(|| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("scene index buffer"),
                size: index_buffer_size(geometry.indices.len()),
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::INDEX,
                mapped_at_creation: false,
            });
            // Queue writes must also be 4-byte multiples, so pad the
            // payload out to the rounded buffer size.
            let mut bytes = bytemuck::cast_slice::<u16, u8>(&geometry.indices).to_vec();
            bytes.resize(index_buffer_size(geometry.indices.len()) as usize, 0);
            queue.write_buffer(&buffer, 0, &bytes);
            IndexResources {
                buffer,
                count: geometry.indices.len() as u32,
            }
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniform buffer"),
            size: mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
            mapped_at_creation: false,
        });
        queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        Self {
            uniforms: Some(UniformResources {
                bind_group,
                buffer: uniform_buffer,
            }),
            index,
            vertex_buffer,
            vertex_count: geometry.vertices.len() as u32,
        }
    }

    /// Rewrite the animation time inside the uniform buffer, leaving every
    /// other byte untouched.
    pub fn write_time(&self, queue: &wgpu::Queue, time: f32) {
        if let Some(uniforms) = &self.uniforms {
            queue.write_buffer(&uniforms.buffer, UNIFORM_TIME_OFFSET, bytemuck::bytes_of(&time));
        }
    }
}
