use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::format::CaptureFormat;
use crate::models::outcome::{CaptureDiagnostics, RecordingMetadata, RecordingOutcome};
use crate::models::state::RecorderPhase;
use crate::processing::level_meter::LevelMeter;
use crate::sink::wav_sink::WavSink;
use crate::traits::input_provider::{BlockCallback, InputProvider, InputStream};

/// Callback receiving the smoothed loudness level once per captured block.
///
/// Runs on the audio layer's thread while the recorder lock is held; it must
/// not block.
pub type LevelCallback = Arc<dyn Fn(f32) + Send + Sync + 'static>;

/// Worker liveness poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long `stop` waits for the worker before force-releasing resources.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(2);

/// Bound on acquiring the state lock on the forced-release path.
const FORCED_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// Mutable session state shared between the controller, the worker, and the
/// hardware callback. Guarded by a single `parking_lot::Mutex`; nothing
/// outside the lock may touch the handles.
struct Shared {
    phase: RecorderPhase,
    running: bool,
    sink: Option<WavSink>,
    stream: Option<Box<dyn InputStream>>,
    meter: LevelMeter,
    diagnostics: CaptureDiagnostics,
    /// Incremented per `start`. A worker abandoned by a forced shutdown may
    /// wake up later; the epoch keeps it from touching a newer session.
    epoch: u64,
}

impl Shared {
    fn new() -> Self {
        Self {
            phase: RecorderPhase::Idle,
            running: false,
            sink: None,
            stream: None,
            meter: LevelMeter::new(),
            diagnostics: CaptureDiagnostics::default(),
            epoch: 0,
        }
    }
}

struct Worker {
    handle: thread::JoinHandle<()>,
    done_rx: mpsc::Receiver<RecordingOutcome>,
    path: PathBuf,
}

/// Microphone capture orchestrator for one recorder instance.
///
/// Owns a background worker per session plus the shared state block the
/// hardware callback writes through. `start` and `stop` drive the
/// `idle → starting → recording → stopping → idle` lifecycle; each session
/// produces exactly one WAV file at the caller-supplied path.
///
/// Data flow:
/// ```text
/// [InputProvider] → hardware callback → [LevelMeter] → level callback
///                                     └→ [WavSink]
/// ```
pub struct AudioRecorder<P: InputProvider> {
    provider: Arc<P>,
    shared: Arc<Mutex<Shared>>,
    format: CaptureFormat,
    worker: Option<Worker>,
}

impl<P: InputProvider> AudioRecorder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            shared: Arc::new(Mutex::new(Shared::new())),
            format: CaptureFormat::DICTATION,
            worker: None,
        }
    }

    pub fn state(&self) -> RecorderPhase {
        self.shared.lock().phase
    }

    /// Most recent smoothed loudness level, for UI polling.
    pub fn level(&self) -> f32 {
        self.shared.lock().meter.level()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.shared.lock().diagnostics
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    /// Start a capture session writing to `path`.
    ///
    /// Valid only from idle; a second `start` while a session is active is
    /// rejected with [`CaptureError::InvalidState`]. The worker is spawned
    /// and this call waits only for its open handshake, so a device or sink
    /// failure surfaces here and leaves no thread or handle behind. Capture
    /// then continues in the background until [`stop`](Self::stop).
    pub fn start(
        &mut self,
        path: impl Into<PathBuf>,
        level_callback: Option<LevelCallback>,
    ) -> Result<(), CaptureError>
    where
        P: 'static,
    {
        if self.worker.is_some() {
            return Err(CaptureError::InvalidState(
                "a capture session is already active".into(),
            ));
        }

        let path = path.into();
        let epoch = {
            let mut s = self.shared.lock();
            s.phase = RecorderPhase::Starting;
            s.meter = LevelMeter::new();
            s.diagnostics = CaptureDiagnostics::default();
            s.epoch += 1;
            s.epoch
        };

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (done_tx, done_rx) = mpsc::channel();

        let provider = Arc::clone(&self.provider);
        let shared = Arc::clone(&self.shared);
        let format = self.format;
        let worker_path = path.clone();

        let spawned = thread::Builder::new()
            .name("mic-capture-worker".into())
            .spawn(move || {
                run_worker(
                    provider,
                    shared,
                    format,
                    worker_path,
                    level_callback,
                    epoch,
                    ready_tx,
                    done_tx,
                )
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.lock().phase = RecorderPhase::Idle;
                return Err(CaptureError::Io(format!(
                    "failed to spawn capture worker: {e}"
                )));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(Worker {
                    handle,
                    done_rx,
                    path,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                self.shared.lock().phase = RecorderPhase::Idle;
                Err(e)
            }
            Err(_) => {
                // Worker died before reporting its open result.
                let _ = handle.join();
                self.shared.lock().phase = RecorderPhase::Idle;
                Err(CaptureError::Io(
                    "capture worker exited before opening the stream".into(),
                ))
            }
        }
    }

    /// Stop the active session and return its outcome.
    ///
    /// Clears the running flag, then waits up to two seconds for the worker
    /// to close the stream and sink cooperatively. If the worker misses the
    /// deadline it is abandoned and whatever handles remain are closed here,
    /// secondary errors discarded — the file may lose its final block but
    /// the caller still gets a finalized recording.
    pub fn stop(&mut self) -> Result<RecordingOutcome, CaptureError> {
        let worker = self.worker.take().ok_or_else(|| {
            CaptureError::InvalidState("no capture session is active".into())
        })?;

        {
            let mut s = self.shared.lock();
            s.phase = RecorderPhase::Stopping;
            s.running = false;
        }

        match worker.done_rx.recv_timeout(SHUTDOWN_DEADLINE) {
            Ok(outcome) => {
                let _ = worker.handle.join();
                Ok(outcome)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                log::warn!(
                    "capture worker did not stop within {SHUTDOWN_DEADLINE:?}; forcing resource release"
                );
                Ok(self.force_release(&worker.path))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                log::error!("capture worker exited without reporting; forcing resource release");
                let _ = worker.handle.join();
                Ok(self.force_release(&worker.path))
            }
        }
    }

    /// Escalation path: pull any remaining handles out under the lock and
    /// close them, discarding secondary errors. The abandoned worker checks
    /// the session epoch before touching shared state again.
    fn force_release(&self, path: &Path) -> RecordingOutcome {
        let (stream, sink, samples_written) = match self.shared.try_lock_for(FORCED_LOCK_TIMEOUT) {
            Some(mut s) => {
                s.running = false;
                s.phase = RecorderPhase::Idle;
                (s.stream.take(), s.sink.take(), s.diagnostics.samples_written)
            }
            None => {
                log::error!("capture state lock is wedged; abandoning handles");
                (None, None, 0)
            }
        };

        if let Some(mut stream) = stream {
            if let Err(e) = stream.close() {
                log::warn!("forced stream close failed: {e}");
            }
        }
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close() {
                log::warn!("forced sink close failed: {e}");
            }
        }

        build_outcome(path, self.format, samples_written)
    }

    #[cfg(test)]
    fn handles_released(&self) -> bool {
        let s = self.shared.lock();
        s.sink.is_none() && s.stream.is_none() && !s.running
    }
}

impl<P: InputProvider> Drop for AudioRecorder<P> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

/// Worker body: open the sink, open the input stream, report the handshake,
/// then poll the running flag while the hardware callback does the real
/// work. Teardown pulls each handle out under the lock and closes it outside
/// — closing the stream can join the audio thread, which may itself be
/// waiting on the lock inside the callback.
#[allow(clippy::too_many_arguments)]
fn run_worker<P: InputProvider>(
    provider: Arc<P>,
    shared: Arc<Mutex<Shared>>,
    format: CaptureFormat,
    path: PathBuf,
    level_callback: Option<LevelCallback>,
    epoch: u64,
    ready_tx: mpsc::SyncSender<Result<(), CaptureError>>,
    done_tx: mpsc::Sender<RecordingOutcome>,
) {
    let sink = match WavSink::create(&path, format) {
        Ok(sink) => sink,
        Err(e) => {
            shared.lock().phase = RecorderPhase::Idle;
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    shared.lock().sink = Some(sink);

    let callback = block_callback(Arc::clone(&shared), level_callback, epoch);
    let stream = match provider.open_stream(format, callback) {
        Ok(stream) => stream,
        Err(e) => {
            let sink = {
                let mut s = shared.lock();
                s.phase = RecorderPhase::Idle;
                s.sink.take()
            };
            if let Some(mut sink) = sink {
                if let Err(close_err) = sink.close() {
                    log::error!("failed to discard capture sink: {close_err}");
                }
            }
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    {
        let mut s = shared.lock();
        s.stream = Some(stream);
        s.running = true;
        s.phase = RecorderPhase::Recording;
    }
    let _ = ready_tx.send(Ok(()));
    log::info!("capture session started: {}", path.display());

    // The hardware callback does the real work; this loop only keeps the
    // session alive until `stop` clears the flag.
    while shared.lock().running {
        thread::sleep(POLL_INTERVAL);
    }

    let stream = {
        let mut s = shared.lock();
        if s.epoch != epoch {
            return;
        }
        s.stream.take()
    };
    if let Some(mut stream) = stream {
        if let Err(e) = stream.close() {
            log::error!("failed to close input stream: {e}");
        }
    }

    let sink = {
        let mut s = shared.lock();
        if s.epoch != epoch {
            return;
        }
        s.sink.take()
    };
    if let Some(mut sink) = sink {
        if let Err(e) = sink.close() {
            log::error!("failed to finalize capture sink: {e}");
        }
    }

    let samples_written = {
        let mut s = shared.lock();
        if s.epoch != epoch {
            return;
        }
        s.phase = RecorderPhase::Idle;
        s.diagnostics.samples_written
    };

    log::info!("capture session finished: {}", path.display());
    let _ = done_tx.send(build_outcome(&path, format, samples_written));
}

/// The hardware callback. Runs on the audio layer's own thread; bounded
/// work, non-reentrant lock acquisition, and never panics across the FFI
/// boundary of whatever backend drives it.
fn block_callback(
    shared: Arc<Mutex<Shared>>,
    level_callback: Option<LevelCallback>,
    epoch: u64,
) -> BlockCallback {
    Arc::new(move |block: &[f32]| {
        let mut guard = shared.lock();
        let s = &mut *guard;

        // Session already tearing down (or superseded): drop the block.
        if !s.running || s.epoch != epoch || s.sink.is_none() {
            return;
        }

        s.diagnostics.callback_count += 1;
        let level = s.meter.process(block);
        if let Some(cb) = &level_callback {
            cb(level);
        }

        if let Some(sink) = s.sink.as_mut() {
            match sink.write(block) {
                Ok(written) => s.diagnostics.samples_written += written as u64,
                Err(e) => {
                    // Best-effort capture: losing one block must not abort
                    // an in-progress dictation.
                    s.diagnostics.write_errors += 1;
                    log::error!("dropped audio block: {e}");
                }
            }
        }
    })
}

fn build_outcome(path: &Path, format: CaptureFormat, samples_written: u64) -> RecordingOutcome {
    let duration_secs = format.duration_secs(samples_written);
    let metadata = RecordingMetadata::new(format, duration_secs, &path.to_string_lossy());
    RecordingOutcome {
        path: path.to_path_buf(),
        duration_secs,
        samples_written,
        metadata,
    }
}
