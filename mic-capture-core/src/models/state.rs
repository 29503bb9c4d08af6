/// Recorder lifecycle state machine.
///
/// State transitions:
/// ```text
/// idle → starting → recording → stopping → idle
/// ```
///
/// `Starting` covers the window between spawning the worker and the worker
/// reporting that the sink and input stream are open. `Stopping` covers the
/// bounded wait for the worker to tear both down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    Starting,
    Recording,
    Stopping,
}

impl RecorderPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}
