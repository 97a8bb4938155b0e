use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub elements: ElementsConfig,
    pub visualizer: VisualizerConfig,
    pub devices: DevicesConfig,
    pub artifacts: ArtifactsConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(alias = "logLevel")]
    pub log_level: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "softphone-recorder".to_string(),
            log_level: "info".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Chunk delivery granularity
    #[serde(alias = "timesliceMs", alias = "timeslice")]
    pub timeslice_ms: u64,
    /// Delay between microphone acquisition attempts
    #[serde(alias = "deviceAcquisitionIntervalMs", alias = "getUserMediaInterval")]
    pub device_acquisition_interval_ms: u64,
    /// How long a session start waits for the customer stream to appear
    #[serde(alias = "remoteStreamWaitMs")]
    pub remote_stream_wait_ms: u64,
    #[serde(alias = "remoteStreamPollMs")]
    pub remote_stream_poll_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            timeslice_ms: 2000,
            device_acquisition_interval_ms: 1000,
            remote_stream_wait_ms: 1000,
            remote_stream_poll_ms: 100,
        }
    }
}

impl RecordingConfig {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms.max(1))
    }

    pub fn device_acquisition_interval(&self) -> Duration {
        Duration::from_millis(self.device_acquisition_interval_ms)
    }

    pub fn remote_stream_wait(&self) -> Duration {
        Duration::from_millis(self.remote_stream_wait_ms)
    }

    pub fn remote_stream_poll(&self) -> Duration {
        Duration::from_millis(self.remote_stream_poll_ms.max(1))
    }
}

/// Identifiers of the page elements the recorder binds to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    #[serde(alias = "remoteAudioId")]
    pub remote_audio_id: Option<String>,
    #[serde(alias = "localRecordAudioId")]
    pub local_record_audio_id: Option<String>,
    #[serde(alias = "localRecordDownloadId")]
    pub local_record_download_id: Option<String>,
    #[serde(alias = "remoteRecordAudioId")]
    pub remote_record_audio_id: Option<String>,
    #[serde(alias = "remoteRecordDownloadId")]
    pub remote_record_download_id: Option<String>,
    #[serde(alias = "localRecordCanvasId")]
    pub local_record_canvas_id: Option<String>,
    #[serde(alias = "remoteRecordCanvasId")]
    pub remote_record_canvas_id: Option<String>,
    #[serde(alias = "localRecordCanvasColor")]
    pub local_record_canvas_color: String,
    #[serde(alias = "remoteRecordCanvasColor")]
    pub remote_record_canvas_color: String,
}

impl Default for ElementsConfig {
    fn default() -> Self {
        Self {
            remote_audio_id: Some("remote-audio".to_string()),
            local_record_audio_id: Some("local-record-audio".to_string()),
            local_record_download_id: Some("local-record-download".to_string()),
            remote_record_audio_id: Some("remote-record-audio".to_string()),
            remote_record_download_id: Some("remote-record-download".to_string()),
            local_record_canvas_id: None,
            remote_record_canvas_id: None,
            local_record_canvas_color: "#00FF00".to_string(),
            remote_record_canvas_color: "#FF8800".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub fft_size: usize,
    pub frame_interval_ms: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            frame_interval_ms: 16,
            width: 300,
            height: 100,
        }
    }
}

impl VisualizerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// WAV file standing in for the operator microphone
    pub microphone_path: Option<String>,
    /// WAV file standing in for the remote party
    pub remote_audio_path: Option<String>,
    pub frame_ms: u64,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            microphone_path: None,
            remote_audio_path: None,
            frame_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStoreKind {
    Memory,
    Disk,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub store: ArtifactStoreKind,
    pub recordings_path: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            store: ArtifactStoreKind::Memory,
            recordings_path: "~/.softphone-recorder/recordings".to_string(),
        }
    }
}

impl ArtifactsConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).into_owned())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: Option<String>,
    pub subject: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            subject: "contact.events.>".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SOFTPHONE_RECORDER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
