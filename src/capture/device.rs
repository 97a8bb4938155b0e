use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::stream::CaptureStream;
use crate::error::{CaptureError, CaptureResult};

/// Capture device capability
///
/// Implementations:
/// - `FileCaptureDevices`: WAV file played in real time (native runtime, demos)
/// - test fakes
#[async_trait]
pub trait CaptureDevices: Send + Sync {
    /// Whether the capture API exists at all
    fn is_supported(&self) -> bool;

    /// Request the operator microphone stream. May suspend until the user
    /// grants permission.
    async fn acquire_microphone(&self) -> CaptureResult<CaptureStream>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Remote playback element capability.
///
/// The customer stream only exists once the call media path is
/// established, so it is read again at every session start.
#[async_trait]
pub trait RemoteAudioSource: Send + Sync {
    /// The stream currently attached as the playback source, if any
    async fn current_stream(&self) -> Option<CaptureStream>;
}

/// Acquisition state of the operator microphone
#[derive(Debug, Clone)]
pub enum AcquisitionState {
    NotAttempted,
    /// Terminal for the process lifetime
    Acquired(CaptureStream),
    /// Last attempt failed, another one is scheduled
    RetryScheduled { failures: u32, last_error: String },
    /// Capture API absent; never retried
    Unavailable,
}

impl AcquisitionState {
    /// The process-wide "recording enabled" flag
    pub fn is_recording_enabled(&self) -> bool {
        matches!(self, AcquisitionState::Acquired(_))
    }

    pub fn stream(&self) -> Option<&CaptureStream> {
        match self {
            AcquisitionState::Acquired(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionState::NotAttempted => "not_attempted",
            AcquisitionState::Acquired(_) => "acquired",
            AcquisitionState::RetryScheduled { .. } => "retry_scheduled",
            AcquisitionState::Unavailable => "unavailable",
        }
    }
}

/// Obtains the operator capture stream once, retrying at a fixed interval
/// until it succeeds or the acquirer is shut down.
pub struct DeviceAcquirer {
    state: Arc<watch::Sender<AcquisitionState>>,
    task: Option<JoinHandle<()>>,
}

impl DeviceAcquirer {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AcquisitionState::NotAttempted);
        Self {
            state: Arc::new(state),
            task: None,
        }
    }

    /// Follow acquisition state changes
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AcquisitionState {
        self.state.borrow().clone()
    }

    /// Start acquiring in the background. Calling again while a previous
    /// run is still in flight, or after success, does nothing.
    pub fn start(&mut self, devices: Arc<dyn CaptureDevices>, retry_interval: Duration) {
        if let Some(task) = &self.task {
            if !task.is_finished() {
                debug!("Device acquisition already running");
                return;
            }
        }

        if self.state.borrow().is_recording_enabled() {
            debug!("Local media stream already acquired");
            return;
        }

        let state = Arc::clone(&self.state);
        self.task = Some(tokio::spawn(async move {
            acquire(devices, &state, retry_interval).await;
        }));
    }

    /// Cancel any pending retry
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for DeviceAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeviceAcquirer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Attempt to obtain the operator stream, chaining one retry per failure
pub async fn acquire(
    devices: Arc<dyn CaptureDevices>,
    state: &watch::Sender<AcquisitionState>,
    retry_interval: Duration,
) {
    if !devices.is_supported() {
        warn!("Audio capture is not supported by {}", devices.name());
        state.send_replace(AcquisitionState::Unavailable);
        return;
    }

    let mut failures = 0u32;

    loop {
        match devices.acquire_microphone().await {
            Ok(stream) => {
                debug!("Got local media stream. ({})", stream.label());
                state.send_replace(AcquisitionState::Acquired(stream));
                info!("Recording enabled after {} failed attempts", failures);
                return;
            }
            Err(CaptureError::Unsupported) => {
                warn!("Audio capture is not supported by {}", devices.name());
                state.send_replace(AcquisitionState::Unavailable);
                return;
            }
            Err(e) => {
                failures += 1;
                warn!(
                    "Failed to get local media stream (attempt {}), retrying in {}ms: {}",
                    failures,
                    retry_interval.as_millis(),
                    e
                );
                state.send_replace(AcquisitionState::RetryScheduled {
                    failures,
                    last_error: e.to_string(),
                });
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}
