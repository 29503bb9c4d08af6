use std::fs;
use std::path::Path;

use crate::models::error::CaptureError;
use crate::models::outcome::RecordingMetadata;

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording}.metadata.json` alongside the recording.
pub fn write_metadata(
    metadata: &RecordingMetadata,
    recording_path: &Path,
) -> Result<(), CaptureError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata).map_err(CaptureError::storage)?;
    fs::write(&metadata_path, json).map_err(CaptureError::storage)?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path).map_err(CaptureError::storage)?;
    serde_json::from_str(&json).map_err(CaptureError::storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::CaptureFormat;

    #[test]
    fn sidecar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("take.wav");

        let metadata = RecordingMetadata::new(CaptureFormat::DICTATION, 2.5, "take.wav");
        write_metadata(&metadata, &recording).unwrap();

        assert!(dir.path().join("take.metadata.json").exists());
        let loaded = read_metadata(&recording).unwrap();
        assert_eq!(loaded, metadata);
    }

    #[test]
    fn missing_sidecar_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metadata(&dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, CaptureError::Storage(_)));
    }
}
