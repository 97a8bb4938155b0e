// Integration tests for configuration loading
//
// These tests verify defaults and that a config file overrides them section
// by section.

use anyhow::Result;
use softphone_recorder::config::{ArtifactStoreKind, Config};
use softphone_recorder::session::SessionConfig;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.recording.timeslice(), Duration::from_millis(2000));
    assert_eq!(cfg.recording.device_acquisition_interval(), Duration::from_millis(1000));
    assert_eq!(cfg.elements.remote_audio_id.as_deref(), Some("remote-audio"));
    assert_eq!(cfg.elements.local_record_audio_id.as_deref(), Some("local-record-audio"));
    assert!(cfg.elements.local_record_canvas_id.is_none());
    assert_eq!(cfg.elements.local_record_canvas_color, "#00FF00");
    assert_eq!(cfg.visualizer.fft_size, 256);
    assert_eq!(cfg.artifacts.store, ArtifactStoreKind::Memory);
    assert_eq!(cfg.nats.subject, "contact.events.>");
    assert!(cfg.nats.url.is_none());
}

#[test]
fn test_load_overrides_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("recorder.toml");
    std::fs::write(
        &path,
        r##"
[service]
name = "test-recorder"

[recording]
timeslice_ms = 500
remote_stream_wait_ms = 0

[elements]
local_record_canvas_id = "local-canvas"
remote_record_download_id = "remote-dl"

[artifacts]
store = "disk"
recordings_path = "/tmp/recordings"
"##,
    )?;

    let cfg = Config::load(path.to_str().expect("utf-8 path"))?;

    assert_eq!(cfg.service.name, "test-recorder");
    assert_eq!(cfg.service.http.port, 8090, "Untouched keys keep defaults");
    assert_eq!(cfg.recording.timeslice(), Duration::from_millis(500));
    assert_eq!(cfg.recording.remote_stream_wait(), Duration::ZERO);
    assert_eq!(cfg.recording.device_acquisition_interval_ms, 1000);
    assert_eq!(cfg.elements.local_record_canvas_id.as_deref(), Some("local-canvas"));
    assert_eq!(cfg.elements.remote_record_download_id.as_deref(), Some("remote-dl"));
    assert_eq!(cfg.artifacts.store, ArtifactStoreKind::Disk);
    assert_eq!(cfg.artifacts.recordings_dir(), std::path::PathBuf::from("/tmp/recordings"));

    let session = SessionConfig::from(&cfg.recording);
    assert_eq!(session.timeslice, Duration::from_millis(500));
    assert_eq!(session.remote_stream_wait, Duration::ZERO);

    Ok(())
}

#[test]
fn test_load_missing_file_fails() {
    assert!(Config::load("/nonexistent/softphone-recorder").is_err());
}

#[test]
fn test_recordings_path_expands_home() {
    let mut cfg = Config::default();
    cfg.artifacts.recordings_path = "~/recordings".to_string();

    let dir = cfg.artifacts.recordings_dir();
    if std::env::var_os("HOME").is_some() {
        assert!(!dir.starts_with("~"));
    }
    assert!(dir.ends_with("recordings"));
}

#[test]
fn test_camel_case_aliases_from_json() -> Result<()> {
    let cfg: Config = serde_json::from_str(
        r##"{
            "recording": {"timeslice": 1500, "getUserMediaInterval": 250},
            "elements": {"remoteAudioId": "ra", "localRecordCanvasColor": "#123456"}
        }"##,
    )?;

    assert_eq!(cfg.recording.timeslice_ms, 1500);
    assert_eq!(cfg.recording.device_acquisition_interval_ms, 250);
    assert_eq!(cfg.elements.remote_audio_id.as_deref(), Some("ra"));
    assert_eq!(cfg.elements.local_record_canvas_color, "#123456");

    Ok(())
}
