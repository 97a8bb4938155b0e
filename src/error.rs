use thiserror::Error;

/// Failures raised by capture, recorder and artifact capabilities.
///
/// None of these ever reach the host: the coordinator downgrades every
/// variant to a log line and carries on with the next lifecycle action.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// The capture API does not exist on this platform. Permanent.
    #[error("Audio capture is not supported")]
    Unsupported,

    /// Permission denied, device busy, missing device. Retried.
    #[error("Failed to acquire capture device: {0}")]
    Acquisition(String),

    /// Stop requested on a recorder that is no longer recording.
    #[error("Recorder is already inactive")]
    AlreadyInactive,

    #[error("Recorder error: {0}")]
    Recorder(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Visualizer error: {0}")]
    Visualizer(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
