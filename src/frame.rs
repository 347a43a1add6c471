//! The per-frame protocol: acquire, encode, submit, present, service.
//!
//! Each tick walks a fixed sequence with strict object lifetimes. The
//! sequence lives in [`FrameDriver::tick`] and is expressed against the
//! [`FrameBackend`] trait so the same state machine drives both the real
//! wgpu backend ([`GpuFrameBackend`]) and the scripted mock driver used by
//! the integration tests.
//!
//! Lifetimes per tick: the frame view, command encoder, pass encoder and
//! command buffer are created inside the tick and are gone again before it
//! returns, in reverse order of dependency. None of them may be cached
//! across ticks.

use crate::context::Context;
use crate::scene::SceneResources;

/// What a drawn tick actually recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// No pipeline configured: the pass only cleared the attachment.
    Clear,
    /// Pipeline bound and geometry drawn.
    Geometry,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No frame texture was available; nothing was encoded or submitted.
    /// The next tick retries implicitly.
    Skipped,
    /// A command buffer was submitted and the frame presented.
    Presented(DrawKind),
}

/// The operations a tick needs from a rendering backend.
///
/// `Frame` is the acquired per-tick texture view (plus whatever the
/// backend must keep alive alongside it). Ownership of the underlying
/// surface texture is a backend contract: with wgpu the presenter owns it
/// and `present` consumes it; a backend where the application owns it
/// releases the texture as soon as the view exists.
pub trait FrameBackend {
    type Frame;

    /// Per-frame uniform update. Runs before acquisition so a skipped
    /// frame still advances the animation clock on the GPU.
    fn write_animation(&mut self, time: f32);

    /// Yield a fresh frame, or `None` when presentation is temporarily
    /// unavailable. Callers must skip the tick on `None`.
    fn acquire_frame(&mut self) -> Option<Self::Frame>;

    /// Encode one render pass against `frame`, finish it into a single
    /// command buffer and submit it.
    fn draw(&mut self, frame: &Self::Frame) -> DrawKind;

    /// Release the view and hand the frame back for presentation.
    fn present(&mut self, frame: Self::Frame);

    /// Service the device's pending asynchronous work. Must run every
    /// tick or queued driver callbacks never fire.
    fn service(&mut self);
}

/// Orchestrates the tick sequence and counts presented frames.
#[derive(Debug, Default)]
pub struct FrameDriver {
    frames_drawn: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames that reached presentation since construction.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Run one tick: uniform write, acquisition (or skip), encode/submit,
    /// present, device service.
    pub fn tick<B: FrameBackend>(&mut self, backend: &mut B, time: f32) -> TickOutcome {
        backend.write_animation(time);

        let Some(frame) = backend.acquire_frame() else {
            // Soft failure: skip the tick without encoding anything. The
            // device is still serviced so pending callbacks fire.
            backend.service();
            return TickOutcome::Skipped;
        };

        let kind = backend.draw(&frame);
        backend.present(frame);
        backend.service();

        self.frames_drawn += 1;
        TickOutcome::Presented(kind)
    }
}

/// A frame acquired from the real surface. The view is dropped before the
/// texture is presented, mirroring the reverse-dependency release order.
pub struct GpuFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// [`FrameBackend`] over a live [`Context`]. Pipeline and scene are
/// optional: with no pipeline the pass degrades to a bare clear.
pub struct GpuFrameBackend<'a> {
    pub ctx: &'a Context,
    pub pipeline: Option<&'a wgpu::RenderPipeline>,
    pub scene: Option<&'a SceneResources>,
}

impl FrameBackend for GpuFrameBackend<'_> {
    type Frame = GpuFrame;

    fn write_animation(&mut self, time: f32) {
        if let Some(scene) = self.scene {
            scene.write_time(&self.ctx.queue, time);
        }
    }

    fn acquire_frame(&mut self) -> Option<GpuFrame> {
        // Any non-success status means "skip this tick", silently; the
        // acquisition is retried next tick anyway.
        let texture = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            _ => return None,
        };

        // The view mirrors the texture's own format and covers its full
        // mip/array range.
        let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Surface Texture View"),
            format: Some(texture.texture.format()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
            ..Default::default()
        });

        Some(GpuFrame { texture, view })
    }

    fn draw(&mut self, frame: &GpuFrame) -> DrawKind {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let mut kind = DrawKind::Clear;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let Some(pipeline) = self.pipeline {
                render_pass.set_pipeline(pipeline);
                if let Some(scene) = self.scene {
                    render_pass.set_vertex_buffer(0, scene.vertex_buffer.slice(..));
                    if let Some(uniforms) = &scene.uniforms {
                        render_pass.set_bind_group(0, &uniforms.bind_group, &[]);
                    }
                    match &scene.index {
                        Some(index) => {
                            render_pass
                                .set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint16);
                            render_pass.draw_indexed(0..index.count, 0, 0..1);
                        }
                        None => render_pass.draw(0..scene.vertex_count, 0..1),
                    }
                    kind = DrawKind::Geometry;
                }
            }
            // The pass encoder drops here, before the command encoder is
            // finished.
        }

        self.ctx
            .queue
            .submit(std::iter::once(encoder.finish()));
        kind
    }

    fn present(&mut self, frame: GpuFrame) {
        // View before texture; the presenter owns the surface texture and
        // `present` consumes it.
        let GpuFrame { texture, view } = frame;
        drop(view);
        texture.present();
    }

    fn service(&mut self) {
        crate::gpu_async::drive(&self.ctx.device);
    }
}
