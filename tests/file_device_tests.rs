// Integration tests for WAV-backed capture devices
//
// These tests verify that WAV files load correctly and play out as live
// capture streams for the operator microphone and the remote party.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use softphone_recorder::capture::{
    AudioFile, CaptureDevices, FileCaptureDevices, FileRemoteAudio, RemoteAudioSource,
};
use softphone_recorder::error::CaptureError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Write `duration_ms` of a ramp signal as 16 kHz mono WAV
fn write_fixture(dir: &Path, name: &str, duration_ms: u32) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec)?;
    for i in 0..(16 * duration_ms) {
        writer.write_sample((i % 1000) as i16)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_fixture(temp_dir.path(), "sample.wav", 500)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 8000);
    assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
    assert!(audio.path.contains("sample.wav"));

    // 100ms frames at 16kHz mono
    assert_eq!(audio.samples_per_frame(100), 1600);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open("/nonexistent/path/to/audio.wav");
    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[tokio::test]
async fn test_microphone_streams_frames() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_fixture(temp_dir.path(), "mic.wav", 100)?;
    let devices = FileCaptureDevices::new(Some(path), 20);

    assert!(devices.is_supported());
    assert_eq!(devices.name(), "file");

    let stream = devices.acquire_microphone().await?;
    assert_eq!(stream.sample_rate(), 16000);
    assert_eq!(stream.channels(), 1);

    let mut frames = stream.subscribe();
    let frame = tokio::time::timeout(Duration::from_secs(2), frames.recv()).await??;
    assert_eq!(frame.samples.len(), 320);

    // The microphone loops instead of ending
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!stream.is_ended());

    Ok(())
}

#[tokio::test]
async fn test_zero_frame_length_still_streams() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_fixture(temp_dir.path(), "mic.wav", 50)?;

    let stream = AudioFile::open(&path)?.into_stream("mic", 0, true);
    let mut frames = stream.subscribe();
    let frame = tokio::time::timeout(Duration::from_secs(2), frames.recv()).await??;
    assert_eq!(frame.samples.len(), 16, "Zero length plays 1ms frames");

    // Same through the device, as configured with frame_ms = 0
    let devices = FileCaptureDevices::new(Some(path), 0);
    let stream = devices.acquire_microphone().await?;
    let mut frames = stream.subscribe();
    tokio::time::timeout(Duration::from_secs(2), frames.recv()).await??;

    Ok(())
}

#[tokio::test]
async fn test_microphone_without_path_is_unsupported() {
    let devices = FileCaptureDevices::new(None, 20);

    assert!(!devices.is_supported());
    assert!(matches!(
        devices.acquire_microphone().await,
        Err(CaptureError::Unsupported)
    ));
}

#[tokio::test]
async fn test_missing_microphone_file_fails_acquisition() {
    let devices = FileCaptureDevices::new(Some(PathBuf::from("/nonexistent/mic.wav")), 20);

    assert!(devices.is_supported());
    assert!(matches!(
        devices.acquire_microphone().await,
        Err(CaptureError::Acquisition(_))
    ));
}

#[tokio::test]
async fn test_remote_audio_absent_until_file_exists() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("remote.wav");
    let remote = FileRemoteAudio::new(path.clone(), 20);

    assert!(remote.current_stream().await.is_none());

    write_fixture(temp_dir.path(), "remote.wav", 60)?;
    let stream = remote.current_stream().await.expect("remote stream attached");

    // A one-shot stream ends after playing the file out
    let mut ended = stream.watch_end();
    tokio::time::timeout(Duration::from_secs(2), ended.wait_for(|ended| *ended)).await??;
    assert!(stream.is_ended());

    Ok(())
}
