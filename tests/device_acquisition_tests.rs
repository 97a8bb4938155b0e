// Integration tests for operator microphone acquisition
//
// These tests verify the fixed-interval retry loop: every failure schedules
// exactly one retry, success is terminal, and an absent capture API is never
// retried.

use anyhow::Result;
use async_trait::async_trait;
use softphone_recorder::capture::{AcquisitionState, CaptureDevices, CaptureStream, DeviceAcquirer};
use softphone_recorder::error::{CaptureError, CaptureResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Devices that fail a given number of times before granting the stream
struct FlakyDevices {
    supported: bool,
    failures: u32,
    attempts: AtomicU32,
    unsupported_error: bool,
}

impl FlakyDevices {
    fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            failures,
            attempts: AtomicU32::new(0),
            unsupported_error: false,
        })
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevices for FlakyDevices {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn acquire_microphone(&self) -> CaptureResult<CaptureStream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.unsupported_error {
            return Err(CaptureError::Unsupported);
        }
        if attempt < self.failures {
            return Err(CaptureError::Acquisition("NotAllowedError".to_string()));
        }
        Ok(CaptureStream::new("flaky-mic", 16000, 1))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

const INTERVAL: Duration = Duration::from_millis(1000);

#[tokio::test(start_paused = true)]
async fn test_retries_once_per_failure_until_acquired() -> Result<()> {
    let devices = FlakyDevices::failing(3);
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();
    let started = Instant::now();

    acquirer.start(devices.clone(), INTERVAL);
    state.wait_for(|s| s.is_recording_enabled()).await?;

    // Three failures, three retries, fourth attempt succeeds
    assert_eq!(devices.attempts(), 4);
    assert!(started.elapsed() >= INTERVAL * 3);

    let acquired = acquirer.state();
    assert_eq!(acquired.label(), "acquired");
    assert_eq!(acquired.stream().map(|s| s.label()), Some("flaky-mic"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_retry_state_reports_failures() -> Result<()> {
    let devices = FlakyDevices::failing(u32::MAX);
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();

    acquirer.start(devices.clone(), INTERVAL);
    state
        .wait_for(|s| matches!(s, AcquisitionState::RetryScheduled { failures: 2, .. }))
        .await?;

    match acquirer.state() {
        AcquisitionState::RetryScheduled { last_error, .. } => {
            assert!(last_error.contains("NotAllowedError"));
        }
        other => panic!("Unexpected state: {:?}", other),
    }
    assert!(!acquirer.state().is_recording_enabled());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_api_is_never_retried() -> Result<()> {
    let devices = Arc::new(FlakyDevices {
        supported: false,
        failures: 0,
        attempts: AtomicU32::new(0),
        unsupported_error: false,
    });
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();

    acquirer.start(devices.clone(), INTERVAL);
    state
        .wait_for(|s| matches!(s, AcquisitionState::Unavailable))
        .await?;

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(devices.attempts(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_error_stops_retrying() -> Result<()> {
    let devices = Arc::new(FlakyDevices {
        supported: true,
        failures: 0,
        attempts: AtomicU32::new(0),
        unsupported_error: true,
    });
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();

    acquirer.start(devices.clone(), INTERVAL);
    state
        .wait_for(|s| matches!(s, AcquisitionState::Unavailable))
        .await?;

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(devices.attempts(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_retry() -> Result<()> {
    let devices = FlakyDevices::failing(u32::MAX);
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();

    acquirer.start(devices.clone(), INTERVAL);
    state
        .wait_for(|s| matches!(s, AcquisitionState::RetryScheduled { failures: 1, .. }))
        .await?;

    acquirer.shutdown();
    let attempts = devices.attempts();

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(devices.attempts(), attempts);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_start_after_success_does_nothing() -> Result<()> {
    let devices = FlakyDevices::failing(0);
    let mut acquirer = DeviceAcquirer::new();
    let mut state = acquirer.subscribe();

    acquirer.start(devices.clone(), INTERVAL);
    state.wait_for(|s| s.is_recording_enabled()).await?;

    acquirer.start(devices.clone(), INTERVAL);
    tokio::time::sleep(INTERVAL * 3).await;

    assert_eq!(devices.attempts(), 1);

    Ok(())
}
