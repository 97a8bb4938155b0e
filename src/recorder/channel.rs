use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::artifact::{Artifact, Blob, ObjectUrls};
use super::media::{MediaChunk, MediaRecorder, RecorderFactory};
use crate::capture::{CaptureStream, Channel};
use crate::elements::UrlSlot;
use crate::error::{CaptureError, CaptureResult};

/// Playback and download elements of one channel, both optional
#[derive(Debug, Clone, Default)]
pub struct ChannelBindings {
    pub playback: Option<Arc<UrlSlot>>,
    pub download: Option<Arc<UrlSlot>>,
}

struct ActiveRecording {
    recorder: Box<dyn MediaRecorder>,
    /// Owns the chunk buffer until the recorder closes its channel
    buffer: JoinHandle<Vec<MediaChunk>>,
}

/// Records one side of the call and turns it into an artifact on stop.
///
/// At most one artifact URL is live per channel: the previous one is
/// unbound and revoked by the next stop, before the new one is minted.
pub struct ChannelRecorder {
    channel: Channel,
    factory: Arc<dyn RecorderFactory>,
    urls: Arc<dyn ObjectUrls>,
    bindings: ChannelBindings,
    active: Option<ActiveRecording>,
    artifact: Option<Artifact>,
}

impl ChannelRecorder {
    pub fn new(
        channel: Channel,
        factory: Arc<dyn RecorderFactory>,
        urls: Arc<dyn ObjectUrls>,
        bindings: ChannelBindings,
    ) -> Self {
        Self {
            channel,
            factory,
            urls,
            bindings,
            active: None,
            artifact: None,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// The live artifact from the last stop, if any
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Start recording `stream` with a fresh, empty buffer
    pub async fn start(&mut self, stream: &CaptureStream, timeslice: Duration) -> CaptureResult<()> {
        let label = self.channel.label();

        if self.active.is_some() {
            return Err(CaptureError::Recorder(format!("[{}] Already recording", label)));
        }

        let mut recorder = self.factory.create(stream)?;
        let chunk_rx = recorder.start(timeslice).await?;

        debug!(
            "[{}] Start audio recording. (Stream: {}, Timeslice: {}ms)",
            label,
            stream.label(),
            timeslice.as_millis()
        );

        self.active = Some(ActiveRecording {
            recorder,
            buffer: tokio::spawn(buffer_chunks(chunk_rx)),
        });

        Ok(())
    }

    /// Stop recording and assemble the artifact.
    ///
    /// Safe to call when not recording. Returns the new artifact, or `None`
    /// when nothing was recorded.
    pub async fn stop(&mut self) -> Option<Artifact> {
        let label = self.channel.label();

        let Some(mut active) = self.active.take() else {
            debug!("[{}] Not recording, nothing to stop", label);
            return None;
        };

        if let Err(e) = active.recorder.stop().await {
            warn!("[{}] Can't stop to record audio because already inactive: {}", label, e);
        }

        let chunks = match active.buffer.await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("[{}] Chunk buffer task failed: {}", label, e);
                Vec::new()
            }
        };

        debug!("[{}] Stop audio recording. ({} chunks)", label, chunks.len());

        self.finalize(&chunks)
    }

    fn finalize(&mut self, chunks: &[MediaChunk]) -> Option<Artifact> {
        let label = self.channel.label();

        if let Some(previous) = self.artifact.take() {
            if let Some(playback) = &self.bindings.playback {
                playback.clear();
            }
            if let Some(download) = &self.bindings.download {
                download.clear();
            }
            self.urls.revoke_object_url(&previous.url);
            debug!("[{}] Revoked audio URL. (URL: {})", label, previous.url);
        }

        let Some(blob) = Blob::from_chunks(chunks) else {
            debug!("[{}] Chunks is empty.", label);
            return None;
        };

        debug!(
            "[{}] Combined blob. (Size: {}, Type: {})",
            label,
            blob.size(),
            blob.mime_type()
        );

        let mime_type = blob.mime_type().to_string();
        let size = blob.size();
        let url = match self.urls.create_object_url(blob) {
            Ok(url) => url,
            Err(e) => {
                warn!("[{}] Failed to create audio URL: {}", label, e);
                return None;
            }
        };
        debug!("[{}] Created audio URL. (URL: {})", label, url);

        if let Some(playback) = &self.bindings.playback {
            playback.set(&url);
        }
        if let Some(download) = &self.bindings.download {
            download.set(&url);
        }

        let artifact = Artifact {
            url,
            mime_type,
            size,
            created_at: chrono::Utc::now(),
        };
        self.artifact = Some(artifact.clone());

        Some(artifact)
    }
}

async fn buffer_chunks(mut chunk_rx: mpsc::Receiver<MediaChunk>) -> Vec<MediaChunk> {
    let mut chunks = Vec::new();
    while let Some(chunk) = chunk_rx.recv().await {
        chunks.push(chunk);
    }
    chunks
}
