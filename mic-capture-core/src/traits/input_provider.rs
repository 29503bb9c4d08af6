use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::format::CaptureFormat;
use crate::models::outcome::InputDevice;

/// Callback invoked once per captured block.
///
/// `block` holds normalized mono `f32` samples at the session's
/// [`CaptureFormat`]; it is borrowed for the duration of the call and the
/// backing buffer is reclaimed by the audio layer afterward.
pub type BlockCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// Interface to the platform audio input layer.
///
/// Implemented by `mic-capture-cpal` for real hardware and by scripted fakes
/// in tests. The provider owns whatever thread the platform delivers audio
/// on; the engine treats every `callback` invocation as coming from an
/// unknown, possibly real-time-constrained context.
pub trait InputProvider: Send + Sync {
    /// Whether an input device is currently available.
    fn is_available(&self) -> bool;

    /// Open an input stream at `format`, delivering blocks via `callback`
    /// until the returned handle is closed.
    ///
    /// The callback fires on the provider's audio thread — keep work there
    /// minimal and never block indefinitely.
    fn open_stream(
        &self,
        format: CaptureFormat,
        callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> InputDevice;
}

/// Handle to a live input stream.
///
/// `close` stops delivery and releases the device. Implementations must
/// tolerate repeated calls; the engine's forced-shutdown path may race a
/// cooperative close that is already in flight.
pub trait InputStream: Send {
    fn close(&mut self) -> Result<(), CaptureError>;
}
