use thiserror::Error;

/// Errors that can occur during capture operations.
///
/// Open-time failures (`DeviceUnavailable`, `Io`) are fatal to the session
/// and propagate out of `start`. Write failures during a live session are
/// logged and counted instead, so a dropped block never aborts an
/// in-progress dictation. A shutdown that misses its deadline is an internal
/// condition, logged as a warning and never surfaced from `stop`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("audio input device unavailable")]
    DeviceUnavailable,

    #[error("i/o error: {0}")]
    Io(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CaptureError {
    pub(crate) fn io(err: impl std::fmt::Display) -> Self {
        Self::Io(err.to_string())
    }

    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}
