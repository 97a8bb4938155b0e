use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capture::CaptureStream;
use crate::error::{CaptureError, CaptureResult};

/// MIME prefix of raw little-endian 16-bit PCM chunks
pub const PCM_MIME_PREFIX: &str = "audio/pcm;format=s16le";

/// One opaque fragment of encoded audio, as delivered by a media recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl MediaChunk {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// Recorder capability wrapping one capture stream
///
/// Contract:
/// - `start` returns a receiver of chunks delivered every `timeslice`, in order
/// - after `stop` the last buffered audio is delivered and the receiver closes
/// - `stop` on an inactive recorder fails with `CaptureError::AlreadyInactive`
#[async_trait]
pub trait MediaRecorder: Send + Sync {
    async fn start(&mut self, timeslice: Duration) -> CaptureResult<mpsc::Receiver<MediaChunk>>;

    async fn stop(&mut self) -> CaptureResult<()>;

    fn is_recording(&self) -> bool;
}

/// Builds a fresh recorder per session around a (possibly shared) stream
pub trait RecorderFactory: Send + Sync {
    fn create(&self, stream: &CaptureStream) -> CaptureResult<Box<dyn MediaRecorder>>;
}

pub fn pcm_mime(sample_rate: u32, channels: u16) -> String {
    format!("{};rate={};channels={}", PCM_MIME_PREFIX, sample_rate, channels)
}

/// Extract `(sample_rate, channels)` from a PCM MIME type
pub fn parse_pcm_mime(mime: &str) -> Option<(u32, u16)> {
    if !mime.starts_with(PCM_MIME_PREFIX) {
        return None;
    }

    let mut rate = None;
    let mut channels = None;
    for param in mime.split(';').skip(1) {
        match param.trim().split_once('=') {
            Some(("rate", v)) => rate = v.parse().ok(),
            Some(("channels", v)) => channels = v.parse().ok(),
            _ => {}
        }
    }

    Some((rate?, channels?))
}

/// Factory for `PcmMediaRecorder`
#[derive(Debug, Default, Clone)]
pub struct PcmRecorderFactory;

impl RecorderFactory for PcmRecorderFactory {
    fn create(&self, stream: &CaptureStream) -> CaptureResult<Box<dyn MediaRecorder>> {
        Ok(Box::new(PcmMediaRecorder::new(stream.clone())))
    }
}

/// Records a capture stream as raw PCM chunks
pub struct PcmMediaRecorder {
    stream: CaptureStream,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PcmMediaRecorder {
    pub fn new(stream: CaptureStream) -> Self {
        Self {
            stream,
            stop_tx: None,
            task: None,
        }
    }
}

#[async_trait]
impl MediaRecorder for PcmMediaRecorder {
    async fn start(&mut self, timeslice: Duration) -> CaptureResult<mpsc::Receiver<MediaChunk>> {
        if self.task.is_some() {
            return Err(CaptureError::Recorder("Recorder already started".to_string()));
        }

        if self.stream.is_ended() {
            return Err(CaptureError::Recorder(format!(
                "Stream {} has already ended",
                self.stream.label()
            )));
        }

        if timeslice.is_zero() {
            return Err(CaptureError::Recorder("Timeslice must be positive".to_string()));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = oneshot::channel();

        let stream = self.stream.clone();
        self.task = Some(tokio::spawn(async move {
            collect(stream, timeslice, chunk_tx, stop_rx).await;
        }));
        self.stop_tx = Some(stop_tx);

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> CaptureResult<()> {
        let stop_tx = self.stop_tx.take().ok_or(CaptureError::AlreadyInactive)?;

        // The collector exits on its own when the stream ends
        stop_tx.send(()).map_err(|_| CaptureError::AlreadyInactive)
    }

    fn is_recording(&self) -> bool {
        self.stop_tx.is_some()
            && self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

async fn collect(
    stream: CaptureStream,
    timeslice: Duration,
    chunk_tx: mpsc::Sender<MediaChunk>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mime = pcm_mime(stream.sample_rate(), stream.channels());
    let mut frames = stream.subscribe();
    let mut ended = stream.watch_end();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);
    let mut pending: Vec<i16> = Vec::new();

    debug!("PCM recorder started on {}", stream.label());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush(&mut pending, &mime, &chunk_tx).await;
            }
            frame = frames.recv() => match frame {
                Ok(frame) => pending.extend_from_slice(&frame.samples),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("PCM recorder on {} lagged, {} frames dropped", stream.label(), skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut stop_rx => break,
            changed = ended.changed() => {
                if changed.is_err() || *ended.borrow() {
                    debug!("Stream {} ended while recording", stream.label());
                    break;
                }
            }
        }
    }

    // Frames already queued before the stop belong to this recording
    while let Ok(frame) = frames.try_recv() {
        pending.extend_from_slice(&frame.samples);
    }
    flush(&mut pending, &mime, &chunk_tx).await;

    debug!("PCM recorder stopped on {}", stream.label());
}

async fn flush(pending: &mut Vec<i16>, mime: &str, chunk_tx: &mpsc::Sender<MediaChunk>) {
    if pending.is_empty() {
        return;
    }

    let data: Vec<u8> = pending.drain(..).flat_map(|s| s.to_le_bytes()).collect();
    if chunk_tx.send(MediaChunk::new(data, mime)).await.is_err() {
        warn!("Chunk receiver dropped, discarding audio");
    }
}
