use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::WavWriter;

use crate::models::error::CaptureError;
use crate::models::format::CaptureFormat;
use crate::processing::conversion;

/// Incrementally-written PCM WAV sink for one capture session.
///
/// Samples arrive as normalized `f32` blocks from the hardware callback and
/// are appended as 16-bit PCM. `close` finalizes the container header and is
/// idempotent: the first call flushes and releases the file, later calls are
/// no-ops. `write` and `close` may run on different threads as long as the
/// caller serializes access (the recorder holds the sink behind its mutex).
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    format: CaptureFormat,
    path: PathBuf,
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("open", &self.writer.is_some())
            .field("format", &self.format)
            .field("path", &self.path)
            .finish()
    }
}

impl WavSink {
    /// Create the output file and write the container header.
    pub fn create(path: impl Into<PathBuf>, format: CaptureFormat) -> Result<Self, CaptureError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(CaptureError::io)?;
            }
        }

        let writer = WavWriter::create(&path, format.wav_spec()).map_err(CaptureError::io)?;

        Ok(Self {
            writer: Some(writer),
            format,
            path,
        })
    }

    /// Append one block of samples. Returns the number of samples written.
    ///
    /// Fails with [`CaptureError::Io`] if the sink is already closed or the
    /// underlying medium rejects the write.
    pub fn write(&mut self, block: &[f32]) -> Result<usize, CaptureError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CaptureError::Io("sink is closed".into()))?;

        for &sample in block {
            writer
                .write_sample(conversion::sample_to_i16(sample))
                .map_err(CaptureError::io)?;
        }
        Ok(block.len())
    }

    /// Finalize the container and release the file. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<(), CaptureError> {
        match self.writer.take() {
            Some(writer) => writer.finalize().map_err(CaptureError::io),
            None => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    fn scratch_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn writes_a_valid_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_path(&dir, "take.wav");

        let mut sink = WavSink::create(&path, CaptureFormat::DICTATION).unwrap();
        let block = vec![0.0f32, 0.5, -0.5, 1.0];
        assert_eq!(sink.write(&block).unwrap(), 4);
        sink.close().unwrap();

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_path(&dir, "idempotent.wav");

        let mut sink = WavSink::create(&path, CaptureFormat::DICTATION).unwrap();
        sink.write(&[0.1, 0.2]).unwrap();

        sink.close().unwrap();
        sink.close().unwrap();
        sink.close().unwrap();

        // The finalized file is intact after the redundant closes.
        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn write_after_close_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_path(&dir, "closed.wav");

        let mut sink = WavSink::create(&path, CaptureFormat::DICTATION).unwrap();
        sink.close().unwrap();

        let err = sink.write(&[0.1]).unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
        assert!(!sink.is_open());
    }

    #[test]
    fn close_from_another_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_path(&dir, "cross_thread.wav");

        let mut sink = WavSink::create(&path, CaptureFormat::DICTATION).unwrap();
        sink.write(&[0.25; 100]).unwrap();

        let handle = std::thread::spawn(move || {
            sink.close().unwrap();
            sink
        });
        let sink = handle.join().unwrap();
        assert!(!sink.is_open());

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 100);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/captures/take.wav");

        let mut sink = WavSink::create(&path, CaptureFormat::DICTATION).unwrap();
        sink.write(&[0.0; 8]).unwrap();
        sink.close().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn create_fails_for_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a WAV file.
        let err = WavSink::create(dir.path(), CaptureFormat::DICTATION).unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }
}
