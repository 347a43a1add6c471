//! Buffer-level semantics: queue FIFO ordering, the partial uniform time
//! write, and index buffer size rounding.

mod common;

use common::test_utils::{Command, MockBackend, MockGpu, UNIFORM_BUFFER, VERTEX_BUFFER};
use kindling::frame::{FrameBackend, FrameDriver};
use kindling::scene::{self, SceneUniforms, UNIFORM_TIME_OFFSET};

#[test]
fn submissions_apply_in_fifo_order() {
    let mut gpu = MockGpu::new();
    gpu.create_buffer(VERTEX_BUFFER, 8);

    // Submission A writes vertex data, submission B draws from it.
    gpu.submit(vec![Command::WriteBuffer {
        target: VERTEX_BUFFER,
        offset: 0,
        bytes: vec![7; 8],
    }]);
    gpu.submit(vec![Command::Draw {
        vertex_source: VERTEX_BUFFER,
    }]);

    let draw = &gpu.executed_draws[0];
    assert_eq!(draw.vertex_source, VERTEX_BUFFER);
    assert_eq!(draw.vertex_bytes, vec![7; 8], "A's writes precede B's draw");
}

#[test]
fn queue_side_writes_precede_later_submissions() {
    let mut gpu = MockGpu::new();
    gpu.create_buffer(VERTEX_BUFFER, 4);

    gpu.write_buffer(VERTEX_BUFFER, 0, &[1, 2, 3, 4]);
    gpu.submit(vec![Command::Draw {
        vertex_source: VERTEX_BUFFER,
    }]);

    assert_eq!(gpu.executed_draws[0].vertex_bytes, vec![1, 2, 3, 4]);
}

#[test]
fn time_write_touches_only_its_declared_bytes() {
    let size = std::mem::size_of::<SceneUniforms>();
    let mut backend = MockBackend::with_uniforms(size);

    // Baseline: a full uniform upload with a recognisable pattern.
    let pattern: Vec<u8> = (0..size as u8).collect();
    backend.gpu.borrow_mut().write_buffer(UNIFORM_BUFFER, 0, &pattern);

    let time = 12.5f32;
    backend.write_animation(time);

    let contents = backend.gpu.borrow().buffer(UNIFORM_BUFFER).to_vec();
    let offset = UNIFORM_TIME_OFFSET as usize;
    assert_eq!(&contents[offset..offset + 4], time.to_le_bytes().as_slice());
    assert_eq!(&contents[..offset], &pattern[..offset], "bytes before the field");
    assert_eq!(
        &contents[offset + 4..],
        &pattern[offset + 4..],
        "bytes after the field"
    );
}

#[test]
fn every_tick_rewrites_the_animation_time() {
    let size = std::mem::size_of::<SceneUniforms>();
    let mut backend = MockBackend::with_uniforms(size);
    let mut driver = FrameDriver::new();

    driver.tick(&mut backend, 1.0);
    driver.tick(&mut backend, 2.0);

    let contents = backend.gpu.borrow().buffer(UNIFORM_BUFFER).to_vec();
    let offset = UNIFORM_TIME_OFFSET as usize;
    assert_eq!(&contents[offset..offset + 4], 2.0f32.to_le_bytes().as_slice());
}

#[test]
fn uniform_struct_layout_matches_the_shader() {
    assert_eq!(std::mem::size_of::<SceneUniforms>(), 32);
    assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
    assert_eq!(UNIFORM_TIME_OFFSET, 16);
}

#[test]
fn index_buffer_sizes_round_up_to_copy_alignment() {
    // 7 sixteen-bit indices are 14 payload bytes -> 16-byte buffer.
    assert_eq!(scene::index_buffer_size(7), 16);
    assert_eq!(scene::index_buffer_size(8), 16);
    assert_eq!(scene::index_buffer_size(2), 4);
    assert_eq!(scene::index_buffer_size(1), 4);
    assert_eq!(scene::index_buffer_size(0), 0);
}
