//! # mic-capture-core
//!
//! Backend-agnostic capture engine for desktop voice dictation.
//!
//! Records microphone audio into an incrementally-written WAV file while
//! deriving a smoothed loudness level for UI feedback, and guarantees a
//! bounded-time shutdown even when the hardware callback is mid-flight.
//! Hardware backends (e.g. `mic-capture-cpal`) implement the
//! [`InputProvider`] trait and plug into the generic [`AudioRecorder`].
//!
//! ## Architecture
//!
//! ```text
//! mic-capture-core (this crate)
//! ├── traits/       ← InputProvider, InputStream, BlockCallback
//! ├── models/       ← CaptureError, RecorderPhase, CaptureFormat, RecordingOutcome
//! ├── processing/   ← LevelMeter, sample conversion helpers
//! ├── sink/         ← WavSink (incremental PCM container)
//! ├── session/      ← AudioRecorder (generic orchestrator)
//! └── storage/      ← metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sink;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::error::CaptureError;
pub use models::format::CaptureFormat;
pub use models::outcome::{CaptureDiagnostics, InputDevice, RecordingMetadata, RecordingOutcome};
pub use models::state::RecorderPhase;
pub use processing::level_meter::LevelMeter;
pub use session::recorder::{AudioRecorder, LevelCallback};
pub use sink::wav_sink::WavSink;
pub use traits::input_provider::{BlockCallback, InputProvider, InputStream};
