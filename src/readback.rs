//! GPU-to-CPU buffer reads via asynchronous mapping.
//!
//! A device-side buffer cannot be read directly; its contents are copied
//! into a `MAP_READ` staging buffer, the copy is submitted, and the staging
//! buffer is mapped asynchronously. The mapping callback only fires while
//! the device is serviced, so completion is awaited with the cooperative
//! spin loop from [`crate::gpu_async`].

use anyhow::{Context as _, Result, anyhow, ensure};

use crate::gpu_async;

/// Copy the first `size` bytes of `source` into a staging buffer and map
/// them back to the CPU.
///
/// Blocks on the mapping callback by driving the device; never call this
/// from inside another driver callback. The staging buffer is unmapped
/// before it drops, at which point the returned bytes are already an owned
/// copy.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    size: wgpu::BufferAddress,
) -> Result<Vec<u8>> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback staging buffer"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    // Request the mapping, then spin the service step until the callback
    // delivers a status.
    let (tx, pending) = gpu_async::completion();
    staging
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
    let status =
        gpu_async::wait_on_device(device, &pending).ok_or_else(|| anyhow!("mapping callback was abandoned"))?;
    status.context("buffer mapping failed")?;

    let mapped = staging.slice(..).get_mapped_range();
    let bytes = mapped.to_vec();
    drop(mapped);
    // Unmap before any further GPU-side write to the buffer would be valid.
    staging.unmap();

    Ok(bytes)
}

/// Demonstration round-trip: upload a recognisable byte pattern, copy it
/// device-to-device, read it back and check it survived.
pub fn roundtrip_demo(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<()> {
    const SIZE: wgpu::BufferAddress = 16;

    let source = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("roundtrip source buffer"),
        size: SIZE,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let numbers: Vec<u8> = (0..SIZE as u8).collect();
    queue.write_buffer(&source, 0, &numbers);

    let bytes = read_buffer(device, queue, &source, SIZE)?;
    log::debug!("roundtrip buffer contents: {:?}", bytes);
    ensure!(bytes == numbers, "readback does not match the uploaded bytes");

    Ok(())
}
