//! Central GPU context: instance/adapter bring-up, device and queue
//! acquisition, and surface configuration.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use winit::window::Window;

use crate::observer::DeviceObserver;

/// Everything long-lived the renderer owns on the GPU side.
///
/// Field order doubles as the teardown order: handles drop top to bottom,
/// so the surface goes before the device and the window (which the surface
/// borrows through its `Arc`) goes last.
#[derive(Debug)]
pub struct Context {
    pub surface: wgpu::Surface<'static>,
    pub queue: wgpu::Queue,
    pub device: wgpu::Device,
    pub config: wgpu::SurfaceConfiguration,
    pub clear_colour: wgpu::Color,
    pub(crate) window: Arc<Window>,
}

impl Context {
    /// Bring up the GPU stack for `window`.
    ///
    /// The instance only lives long enough to hand out the surface and the
    /// adapter; the adapter only long enough to negotiate the surface
    /// format and spawn the device. Both drop at the end of this function.
    /// Any failure here is fatal to initialization and leaves no partially
    /// usable state behind.
    pub async fn new(window: Arc<Window>, observer: Arc<dyn DeviceObserver>) -> Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU.
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create a surface for the window")?;

        log::info!("Requesting adapter");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter found")?;

        log::info!("Requesting device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kindling device"),
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("failed to acquire a logical device")?;

        // Both conditions are observed, never acted upon.
        let lost_observer = observer.clone();
        device.set_device_lost_callback(move |reason, message| {
            lost_observer.device_lost(reason, &message);
        });
        device.on_uncaptured_error(Arc::new(move |error| {
            observer.uncaptured_error(&error);
        }));

        log::info!("Configuring surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an sRGB surface texture; on a linear format
        // all colours would come out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            queue,
            device,
            config,
            clear_colour: wgpu::Color {
                r: 0.9,
                g: 0.1,
                b: 0.2,
                a: 1.0,
            },
            window,
        })
    }
}
