//! Mock GPU driver for exercising the frame protocol without a device.
//!
//! Three pieces:
//! - [`HandleLedger`]/[`Handle`]: RAII guards standing in for driver
//!   handles; every create bumps a counter, every drop balances it, so a
//!   test can assert that a tick releases exactly what it acquired.
//! - [`MockGpu`]: named byte buffers plus a FIFO submission queue. Draw
//!   commands snapshot their source buffer at execution time, which makes
//!   write/draw ordering observable.
//! - [`MockBackend`]: a `FrameBackend` over both, with a scriptable
//!   surface and a configurable surface-texture ownership contract.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use kindling::frame::{DrawKind, FrameBackend};
use kindling::scene::UNIFORM_TIME_OFFSET;

/// Shared create/release counter with a high-water mark.
#[derive(Clone, Default)]
pub struct HandleLedger {
    inner: Rc<LedgerInner>,
}

#[derive(Default)]
struct LedgerInner {
    live: Cell<i64>,
    peak: Cell<i64>,
}

impl HandleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently live handles.
    pub fn live(&self) -> i64 {
        self.inner.live.get()
    }

    /// Highest number of simultaneously live handles ever observed.
    pub fn peak(&self) -> i64 {
        self.inner.peak.get()
    }

    pub fn track(&self) -> Handle {
        let live = self.inner.live.get() + 1;
        self.inner.live.set(live);
        if live > self.inner.peak.get() {
            self.inner.peak.set(live);
        }
        Handle {
            ledger: self.inner.clone(),
        }
    }
}

/// One tracked driver handle; releases itself on drop.
pub struct Handle {
    ledger: Rc<LedgerInner>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.ledger.live.set(self.ledger.live.get() - 1);
    }
}

pub type BufferId = &'static str;

pub const UNIFORM_BUFFER: BufferId = "uniforms";
pub const VERTEX_BUFFER: BufferId = "vertices";

/// A recorded command inside a mock command buffer.
pub enum Command {
    WriteBuffer {
        target: BufferId,
        offset: usize,
        bytes: Vec<u8>,
    },
    Draw {
        vertex_source: BufferId,
    },
    Clear,
}

/// A draw observed during submission execution: which buffer it read and
/// what that buffer held at that moment.
pub struct ExecutedDraw {
    pub vertex_source: BufferId,
    pub vertex_bytes: Vec<u8>,
}

/// Mock device + queue: named buffers and in-order submission execution.
#[derive(Default)]
pub struct MockGpu {
    buffers: HashMap<BufferId, Vec<u8>>,
    pub executed_draws: Vec<ExecutedDraw>,
    pub submissions: usize,
    pub service_calls: usize,
}

impl MockGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_buffer(&mut self, id: BufferId, size: usize) {
        self.buffers.insert(id, vec![0; size]);
    }

    /// Queue-side write: applied immediately, ahead of any later submission.
    pub fn write_buffer(&mut self, id: BufferId, offset: usize, bytes: &[u8]) {
        let buffer = self.buffers.get_mut(id).expect("unknown buffer");
        buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn buffer(&self, id: BufferId) -> &[u8] {
        self.buffers.get(id).expect("unknown buffer")
    }

    /// Execute a command buffer. Commands apply strictly in order; draws
    /// snapshot their source buffer as it stands when they execute.
    pub fn submit(&mut self, commands: Vec<Command>) {
        self.submissions += 1;
        for command in commands {
            match command {
                Command::WriteBuffer {
                    target,
                    offset,
                    bytes,
                } => self.write_buffer(target, offset, &bytes),
                Command::Draw { vertex_source } => {
                    let snapshot = self.buffer(vertex_source).to_vec();
                    self.executed_draws.push(ExecutedDraw {
                        vertex_source,
                        vertex_bytes: snapshot,
                    });
                }
                Command::Clear => {}
            }
        }
    }

    pub fn service(&mut self) {
        self.service_calls += 1;
    }
}

/// A frame handed out by the mock presenter.
pub struct MockFrame {
    pub view: Handle,
    /// Present only when the application owns the surface texture; a
    /// presenter-owned texture was already released at acquisition.
    pub texture: Option<Handle>,
}

/// Scriptable `FrameBackend` over [`MockGpu`].
pub struct MockBackend {
    pub gpu: Rc<RefCell<MockGpu>>,
    pub ledger: HandleLedger,
    /// Upcoming acquisition results; an empty script means success.
    pub surface_script: VecDeque<bool>,
    /// Whether the application (rather than the presenter) owns the
    /// surface texture once its view exists.
    pub owns_surface_texture: bool,
    /// Draw geometry (true) or record a bare clear (false).
    pub has_geometry: bool,
    pub frames_presented: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        let mut gpu = MockGpu::new();
        gpu.create_buffer(VERTEX_BUFFER, 16);
        Self {
            gpu: Rc::new(RefCell::new(gpu)),
            ledger: HandleLedger::new(),
            surface_script: VecDeque::new(),
            owns_surface_texture: true,
            has_geometry: true,
            frames_presented: 0,
        }
    }

    pub fn with_uniforms(size: usize) -> Self {
        let backend = Self::new();
        backend.gpu.borrow_mut().create_buffer(UNIFORM_BUFFER, size);
        backend
    }

    pub fn script_surface(&mut self, results: impl IntoIterator<Item = bool>) {
        self.surface_script.extend(results);
    }
}

impl FrameBackend for MockBackend {
    type Frame = MockFrame;

    fn write_animation(&mut self, time: f32) {
        let mut gpu = self.gpu.borrow_mut();
        if gpu.buffers.contains_key(UNIFORM_BUFFER) {
            gpu.write_buffer(
                UNIFORM_BUFFER,
                UNIFORM_TIME_OFFSET as usize,
                &time.to_le_bytes(),
            );
        }
    }

    fn acquire_frame(&mut self) -> Option<MockFrame> {
        if !self.surface_script.pop_front().unwrap_or(true) {
            return None;
        }
        let texture = self.ledger.track();
        let view = self.ledger.track();
        // The ownership contract decides who releases the texture: the
        // application drops it right after view creation, a presenter
        // keeps it alive until presentation.
        let texture = (!self.owns_surface_texture).then_some(texture);
        Some(MockFrame { view, texture })
    }

    fn draw(&mut self, _frame: &MockFrame) -> DrawKind {
        let encoder = self.ledger.track();
        let pass = self.ledger.track();
        let (commands, kind) = if self.has_geometry {
            (
                vec![Command::Draw {
                    vertex_source: VERTEX_BUFFER,
                }],
                DrawKind::Geometry,
            )
        } else {
            (vec![Command::Clear], DrawKind::Clear)
        };
        drop(pass);
        let command_buffer = self.ledger.track();
        drop(encoder);
        self.gpu.borrow_mut().submit(commands);
        drop(command_buffer);
        kind
    }

    fn present(&mut self, frame: MockFrame) {
        let MockFrame { view, texture } = frame;
        drop(view);
        drop(texture);
        self.frames_presented += 1;
    }

    fn service(&mut self) {
        self.gpu.borrow_mut().service();
    }
}
