//! Render pipeline construction.
//!
//! One-shot builders: the shader module is compiled, baked into the
//! pipeline and dropped again before the builder returns. Nothing here is
//! re-entrant or frame-scoped.

use crate::scene::Vertex;

/// The embedded scene shader. Kept as an immutable build-time constant;
/// a file-loaded source (see [`crate::resources::load_shader`]) can stand
/// in for it.
pub const SCENE_SHADER: &str = include_str!("scene_shader.wgsl");

/// Build the scene pipeline: interleaved position/colour vertices, alpha
/// blending against the negotiated surface format, and the uniform block
/// at group 0.
pub fn mk_scene_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    uniform_layout: &wgpu::BindGroupLayout,
    shader_source: &str,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[Some(uniform_layout)],
        immediate_size: 0,
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    };

    mk_render_pipeline(
        device,
        Some(&pipeline_layout),
        config.format,
        // The standard "over" equation for colour; alpha passes through.
        Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        &[Vertex::desc()],
        shader,
    )
}

/// General pipeline builder. The fixed-function state is the one every
/// pass in this crate uses: triangle list, CCW front faces, no culling,
/// no depth/stencil, single sample with a full mask.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: Option<&wgpu::PipelineLayout>,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout,
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
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
        multiview_mask: None,
    })
    // The shader module drops here; the pipeline keeps its own compiled copy.
}
