use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::CaptureFormat;

/// Result returned when a capture session stops.
///
/// One outcome per session; callers that want totals across sessions
/// aggregate these themselves. There is no process-wide mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingOutcome {
    /// Path of the finished (possibly truncated) WAV file.
    pub path: PathBuf,

    /// Captured duration in seconds, derived from the samples written.
    pub duration_secs: f64,

    /// Mono samples that reached the sink.
    pub samples_written: u64,

    /// Serializable record of the session, suitable for a sidecar file.
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar written by [`crate::storage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub file_path: String,
}

impl RecordingMetadata {
    pub fn new(format: CaptureFormat, duration_secs: f64, file_path: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs,
            sample_rate: format.sample_rate,
            channels: format.channels,
            bits_per_sample: format.bits_per_sample,
            file_path: file_path.to_string(),
        }
    }
}

/// Per-session counters for debugging capture behavior.
///
/// `write_errors` counts blocks the sink rejected; those blocks are dropped
/// and the session keeps running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub callback_count: u64,
    pub samples_written: u64,
    pub write_errors: u64,
}

/// An audio input device known to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub name: String,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_captures_format() {
        let meta = RecordingMetadata::new(CaptureFormat::DICTATION, 1.5, "/tmp/take.wav");
        assert_eq!(meta.sample_rate, 22_050);
        assert_eq!(meta.channels, 1);
        assert_eq!(meta.bits_per_sample, 16);
        assert_eq!(meta.duration_secs, 1.5);
        assert_eq!(meta.file_path, "/tmp/take.wav");
        assert!(!meta.id.is_empty());
    }

    #[test]
    fn metadata_ids_are_unique() {
        let a = RecordingMetadata::new(CaptureFormat::DICTATION, 0.0, "a.wav");
        let b = RecordingMetadata::new(CaptureFormat::DICTATION, 0.0, "b.wav");
        assert_ne!(a.id, b.id);
    }
}
