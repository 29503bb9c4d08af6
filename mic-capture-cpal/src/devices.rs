//! Input device enumeration.

use cpal::traits::{DeviceTrait, HostTrait};

use mic_capture_core::models::error::CaptureError;
use mic_capture_core::models::outcome::InputDevice;

/// List the audio input devices visible to the default host.
///
/// Devices whose names cannot be read are skipped rather than failing the
/// whole listing.
pub fn list_input_devices() -> Result<Vec<InputDevice>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host
        .input_devices()
        .map_err(|e| CaptureError::Io(e.to_string()))?
    {
        match device.name() {
            Ok(name) => {
                let is_default = Some(&name) == default_name.as_ref();
                devices.push(InputDevice { name, is_default });
            }
            Err(e) => log::warn!("skipping input device with unreadable name: {e}"),
        }
    }
    Ok(devices)
}
