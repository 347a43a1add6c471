//! Application lifecycle and event loop.
//!
//! The [`App`] owns the window and every long-lived GPU handle, wires the
//! winit event loop to the frame driver, and guarantees teardown order
//! through field declaration order. One tick runs per redraw request:
//! events are polled by winit, the animation uniform is rewritten, and the
//! frame driver walks the acquire/encode/submit/present/service sequence.
//!
//! Initialization is asynchronous (adapter and device requests resolve via
//! driver callbacks). On native targets it is blocked on with the runtime;
//! on wasm it completes through a user event once the future resolves.

use std::{fmt::Debug, path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::Context,
    frame::{FrameDriver, GpuFrameBackend},
    observer::{DeviceObserver, LogObserver},
    pipelines,
    resources::{self, Geometry},
    scene::{self, SceneResources, SceneUniforms},
};

/// Fixed window size; the window is not resizable.
pub const WINDOW_WIDTH: u32 = 640;
pub const WINDOW_HEIGHT: u32 = 480;

/// Initial tint for the scene uniform block.
const SCENE_COLOR: [f32; 4] = [0.0, 1.0, 0.4, 1.0];

/// Startup configuration. Both paths are optional; the embedded shader and
/// the built-in demo shape are the defaults.
#[derive(Debug, Default, Clone)]
pub struct AppOptions {
    pub geometry: Option<PathBuf>,
    pub shader: Option<PathBuf>,
}

/// Everything that exists between successful initialization and shutdown.
///
/// Field order encodes the release order: scene resources (bind group and
/// buffers) and the pipeline go before the context, and inside the context
/// the surface goes before the device and the window.
#[derive(Debug)]
pub struct AppState {
    driver: FrameDriver,
    scene: SceneResources,
    pipeline: wgpu::RenderPipeline,
    ctx: Context,
    started: Instant,
}

impl AppState {
    async fn new(
        window: Arc<Window>,
        options: &AppOptions,
        observer: Arc<dyn DeviceObserver>,
    ) -> Result<Self> {
        let ctx = Context::new(window, observer).await?;

        let geometry = match &options.geometry {
            Some(path) => resources::load_geometry(path)?,
            None => Geometry::demo_shape(),
        };
        let shader_source = match &options.shader {
            Some(path) => resources::load_shader(path)?,
            None => pipelines::SCENE_SHADER.to_string(),
        };

        let uniform_layout = scene::uniform_layout(&ctx.device);
        let pipeline =
            pipelines::mk_scene_pipeline(&ctx.device, &ctx.config, &uniform_layout, &shader_source);
        let scene = SceneResources::new(
            &ctx.device,
            &ctx.queue,
            &geometry,
            &uniform_layout,
            SceneUniforms::new(SCENE_COLOR),
        );

        // Mapping demo. A failure here is logged and the read skipped; it
        // never blocks startup. Skipped on the web, where spinning on the
        // service step would starve the browser's event loop.
        #[cfg(not(target_arch = "wasm32"))]
        if let Err(e) = crate::readback::roundtrip_demo(&ctx.device, &ctx.queue) {
            log::warn!("buffer mapping demo failed: {:#}", e);
        }

        Ok(Self {
            driver: FrameDriver::new(),
            scene,
            pipeline,
            ctx,
            started: Instant::now(),
        })
    }

    /// One tick of the main loop. Never fails: an unavailable frame
    /// texture skips the tick silently.
    fn redraw(&mut self) {
        // Keep the loop going.
        self.ctx.window.request_redraw();

        let time = self.started.elapsed().as_secs_f32();
        let Self {
            driver,
            scene,
            pipeline,
            ctx,
            ..
        } = self;
        let mut backend = GpuFrameBackend {
            ctx: &*ctx,
            pipeline: Some(&*pipeline),
            scene: Some(&*scene),
        };
        driver.tick(&mut backend, time);
    }
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    InitFailed(anyhow::Error),
}

impl Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::InitFailed(e) => f.debug_tuple("InitFailed").field(e).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    options: AppOptions,
    observer: Arc<dyn DeviceObserver>,
    state: Option<AppState>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        options: AppOptions,
        observer: Arc<dyn DeviceObserver>,
    ) -> Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()
                .context("failed to start the async runtime")?,
            proxy: event_loop.create_proxy(),
            options,
            observer,
            state: None,
            failure: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Failed to initialize the application: {:#}", error);
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("kindling")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .with_resizable(false);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().expect("no browser window");
            let document = window.document().expect("no document");
            let canvas = document
                .get_element_by_id(CANVAS_ID)
                .expect("no canvas element");
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                return self.fail(event_loop, anyhow::Error::new(e).context("window creation"));
            }
        };

        let options = self.options.clone();
        let observer = self.observer.clone();
        let init_future = async move { AppState::new(window, &options, observer).await };

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init_future) {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => AppEvent::Initialized(Box::new(state)),
                    Err(e) => AppEvent::InitFailed(e),
                };
                assert!(proxy.send_event(event).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(*state);
            }
            AppEvent::InitFailed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Some(state) = &mut self.state {
                    state.redraw();
                }
            }
            _ => {}
        }
    }
}

/// Run the application until the window is closed.
///
/// Returns an error when initialization fails; a normal close returns
/// `Ok`. The process exit code mapping lives in the binary.
pub fn run(options: AppOptions) -> Result<()> {
    run_with(options, Arc::new(LogObserver))
}

/// [`run`] with a custom device observer.
pub fn run_with(options: AppOptions, observer: Arc<dyn DeviceObserver>) -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    console_log::init_with_level(log::Level::Info).expect("could not initialize logger");

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, options, observer)?;
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
