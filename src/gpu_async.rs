//! Cooperative completion handles for driver callbacks.
//!
//! The driver reports adapter requests, buffer mappings and similar
//! operations through callbacks that only fire while the device is being
//! serviced. There is no blocking primitive to wait on; instead a caller
//! holds a [`Pending`] handle and spins the service step until the callback
//! delivers a value. [`wait_with`] packages that spin loop as a
//! blocking-style convenience without hiding the cooperative model: each
//! iteration is exactly one non-blocking drive of the device.
//!
//! Waiting this way must never happen from inside another driver callback;
//! the servicing step would not be re-entered and the loop could not make
//! progress.

use futures::FutureExt;
use futures_intrusive::channel::shared::{OneshotReceiver, OneshotSender, oneshot_channel};

/// State of a [`Pending`] handle at one point in time.
#[derive(Debug, PartialEq)]
pub enum Resolution<T> {
    /// The callback has not fired yet; keep driving the device.
    NotReady,
    /// The callback fired and delivered a value.
    Ready(T),
    /// The callback was dropped without firing; the value will never come.
    Abandoned,
}

/// Receiving half of a one-shot driver completion.
pub struct Pending<T: 'static> {
    rx: OneshotReceiver<T>,
}

/// Create a completion pair. The sender side is moved into the driver
/// callback; the [`Pending`] side is polled by the waiter.
pub fn completion<T: Send + 'static>() -> (OneshotSender<T>, Pending<T>) {
    let (tx, rx) = oneshot_channel();
    (tx, Pending { rx })
}

impl<T: 'static> Pending<T> {
    /// Check for the value without blocking or driving anything.
    pub fn poll(&self) -> Resolution<T> {
        match self.rx.receive().now_or_never() {
            None => Resolution::NotReady,
            Some(Some(value)) => Resolution::Ready(value),
            Some(None) => Resolution::Abandoned,
        }
    }
}

/// One non-blocking service step: lets queued driver callbacks fire.
/// Returns `false` if the device could not be polled.
pub fn drive(device: &wgpu::Device) -> bool {
    device.poll(wgpu::PollType::Poll).is_ok()
}

/// Spin `drive_fn` until `pending` resolves. Returns `None` if the callback
/// was abandoned or the drive step reports failure.
pub fn wait_with<T>(pending: &Pending<T>, mut drive_fn: impl FnMut() -> bool) -> Option<T> {
    loop {
        match pending.poll() {
            Resolution::Ready(value) => return Some(value),
            Resolution::Abandoned => return None,
            Resolution::NotReady => {
                if !drive_fn() {
                    return None;
                }
            }
        }
    }
}

/// Blocking-style wait on a real device: loops [`drive`] until `pending`
/// resolves.
pub fn wait_on_device<T>(device: &wgpu::Device, pending: &Pending<T>) -> Option<T> {
    wait_with(pending, || drive(device))
}
