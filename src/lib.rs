//! kindling
//!
//! A compact wgpu starter application. It walks the full life of a GPU
//! frame: instance and adapter bring-up, device and queue acquisition,
//! surface configuration, pipeline construction, vertex/index/uniform
//! upload, and a per-frame loop that encodes, submits and presents one
//! command buffer per tick. The per-frame protocol is kept behind a small
//! backend trait so the whole loop can be exercised against a mock driver
//! in the integration tests, without a window or a GPU.
//!
//! High-level modules
//! - `app`: window lifecycle, event loop and the per-tick orchestration
//! - `context`: GPU bring-up; owns surface, device, queue and surface config
//! - `frame`: the frame driver state machine and its backend trait
//! - `gpu_async`: cooperative completion handles for driver callbacks
//! - `observer`: device-lost / uncaptured-error observers
//! - `pipelines`: render pipeline construction and the embedded shader
//! - `readback`: GPU-to-CPU buffer copies via asynchronous mapping
//! - `resources`: shader and geometry loading from disk
//! - `scene`: vertex/uniform data models and GPU buffer upload

pub mod app;
pub mod context;
pub mod frame;
pub mod gpu_async;
pub mod observer;
pub mod pipelines;
pub mod readback;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::event::WindowEvent;
pub use wgpu::*;
