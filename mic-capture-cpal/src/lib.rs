//! # mic-capture-cpal
//!
//! cpal microphone backend for `mic-capture-core`.
//!
//! Provides:
//! - `CpalInputProvider` — microphone capture via the platform's default
//!   audio host (ALSA/PulseAudio, CoreAudio, WASAPI)
//! - `list_input_devices` — input device enumeration
//!
//! ## Usage
//! ```ignore
//! use mic_capture_core::AudioRecorder;
//! use mic_capture_cpal::CpalInputProvider;
//!
//! let mut recorder = AudioRecorder::new(CpalInputProvider::default_device());
//! recorder.start("dictation.wav", None)?;
//! // ... speak ...
//! let outcome = recorder.stop()?;
//! ```

pub mod devices;
pub mod provider;

pub use devices::list_input_devices;
pub use provider::CpalInputProvider;
