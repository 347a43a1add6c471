//! Device condition observers.
//!
//! The driver reports two asynchronous conditions we care about: the device
//! being lost and uncaptured validation/runtime errors. Both are
//! fire-and-forget diagnostics here; neither changes control flow. The
//! observer is injectable so embedders can route the reports into their own
//! sink instead of the `log` facade.

/// Observer for asynchronous driver-reported device conditions.
///
/// The default methods log and nothing else, which is the behaviour the
/// application wants: a lost device or a validation error is diagnostic
/// output, not a recoverable event at this layer.
pub trait DeviceObserver: Send + Sync {
    /// Invoked once when the device stops being available.
    fn device_lost(&self, reason: wgpu::DeviceLostReason, message: &str) {
        log::warn!("Device lost: reason {:?} ({})", reason, message);
    }

    /// Invoked for every error the driver reports outside an error scope.
    fn uncaptured_error(&self, error: &wgpu::Error) {
        log::error!("Uncaptured device error: {}", error);
    }
}

/// The stock observer: forwards both conditions to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DeviceObserver for LogObserver {}
