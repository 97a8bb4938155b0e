use anyhow::{Context, Result};
use async_trait::async_trait;
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::device::{CaptureDevices, RemoteAudioSource};
use super::stream::{AudioFrame, CaptureStream};
use crate::error::{CaptureError, CaptureResult};

/// A WAV file fully loaded in memory
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Number of interleaved samples in one frame of `frame_ms`
    pub fn samples_per_frame(&self, frame_ms: u64) -> usize {
        let per_second = self.sample_rate as u64 * self.channels as u64;
        ((per_second * frame_ms) / 1000).max(self.channels as u64) as usize
    }

    /// Turn the file into a live stream played in real time.
    ///
    /// A looping stream plays for the process lifetime; a one-shot stream
    /// ends once the file has been played out. A zero `frame_ms` plays
    /// 1 ms frames.
    pub fn into_stream(self, label: &str, frame_ms: u64, looping: bool) -> CaptureStream {
        let frame_ms = frame_ms.max(1);
        let stream = CaptureStream::new(label, self.sample_rate, self.channels);
        let handle = stream.clone();
        let frame_len = self.samples_per_frame(frame_ms);

        tokio::spawn(async move {
            play(self, handle, frame_len, frame_ms, looping).await;
        });

        stream
    }
}

async fn play(file: AudioFile, stream: CaptureStream, frame_len: usize, frame_ms: u64, looping: bool) {
    // First frame after one period, so consumers can subscribe before it lands
    let period = Duration::from_millis(frame_ms);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    let mut position = 0usize;
    let mut timestamp_ms = 0u64;

    if file.samples.is_empty() {
        warn!("Audio file is empty: {}", file.path);
        stream.end();
        return;
    }

    loop {
        ticker.tick().await;

        if position >= file.samples.len() {
            if !looping {
                debug!("Finished playing {}", file.path);
                stream.end();
                return;
            }
            position = 0;
        }

        let end = (position + frame_len).min(file.samples.len());
        stream.push(AudioFrame {
            samples: file.samples[position..end].to_vec(),
            sample_rate: file.sample_rate,
            channels: file.channels,
            timestamp_ms,
        });

        position = end;
        timestamp_ms += frame_ms;
    }
}

async fn load(path: PathBuf) -> CaptureResult<AudioFile> {
    tokio::task::spawn_blocking(move || AudioFile::open(&path))
        .await
        .map_err(|e| CaptureError::Acquisition(format!("Loader task failed: {}", e)))?
        .map_err(|e| CaptureError::Acquisition(format!("{:#}", e)))
}

/// Operator microphone backed by a WAV file, looped for the process lifetime.
///
/// A missing file fails acquisition, so the retry loop keeps polling until
/// the file shows up.
pub struct FileCaptureDevices {
    microphone_path: Option<PathBuf>,
    frame_ms: u64,
}

impl FileCaptureDevices {
    pub fn new(microphone_path: Option<PathBuf>, frame_ms: u64) -> Self {
        Self {
            microphone_path,
            frame_ms,
        }
    }
}

#[async_trait]
impl CaptureDevices for FileCaptureDevices {
    fn is_supported(&self) -> bool {
        self.microphone_path.is_some()
    }

    async fn acquire_microphone(&self) -> CaptureResult<CaptureStream> {
        let path = self
            .microphone_path
            .clone()
            .ok_or(CaptureError::Unsupported)?;

        let file = load(path).await?;
        Ok(file.into_stream("operator-microphone", self.frame_ms, true))
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Remote playback source backed by a WAV file.
///
/// Each call to `current_stream` opens the file again and plays it once,
/// as a fresh remote party would.
pub struct FileRemoteAudio {
    path: PathBuf,
    frame_ms: u64,
}

impl FileRemoteAudio {
    pub fn new(path: PathBuf, frame_ms: u64) -> Self {
        Self { path, frame_ms }
    }
}

#[async_trait]
impl RemoteAudioSource for FileRemoteAudio {
    async fn current_stream(&self) -> Option<CaptureStream> {
        if !self.path.exists() {
            debug!("Remote audio not attached yet: {}", self.path.display());
            return None;
        }

        match load(self.path.clone()).await {
            Ok(file) => Some(file.into_stream("customer-remote", self.frame_ms, false)),
            Err(e) => {
                warn!("Failed to open remote audio: {}", e);
                None
            }
        }
    }
}
