use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::media::{parse_pcm_mime, MediaChunk};
use crate::error::{CaptureError, CaptureResult};

/// Immutable binary blob assembled from recorded chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Arc<[u8]>,
    mime_type: String,
}

impl Blob {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Concatenate chunks in arrival order, typed after the first chunk.
    /// Returns `None` for an empty recording.
    pub fn from_chunks(chunks: &[MediaChunk]) -> Option<Self> {
        let first = chunks.first()?;
        let total = chunks.iter().map(|c| c.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }
        Some(Self::new(data, first.mime_type.clone()))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A finalized recording, reachable through a revocable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub url: String,
    pub mime_type: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

/// Revocable URL minting capability
pub trait ObjectUrls: Send + Sync {
    fn create_object_url(&self, blob: Blob) -> CaptureResult<String>;

    /// Unknown URLs are ignored
    fn revoke_object_url(&self, url: &str);

    fn resolve(&self, url: &str) -> Option<Blob>;

    /// Number of URLs minted and not yet revoked
    fn live_count(&self) -> usize;
}

/// Keeps blobs in memory under `blob:<uuid>` URLs
#[derive(Debug, Default)]
pub struct MemoryObjectUrls {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl MemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectUrls for MemoryObjectUrls {
    fn create_object_url(&self, blob: Blob) -> CaptureResult<String> {
        let url = format!("blob:{}", uuid::Uuid::new_v4());
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| CaptureError::Artifact("Object URL table poisoned".to_string()))?;
        blobs.insert(url.clone(), blob);
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.remove(url);
        }
    }

    fn resolve(&self, url: &str) -> Option<Blob> {
        self.blobs.lock().ok()?.get(url).cloned()
    }

    fn live_count(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }
}

struct StoredFile {
    path: PathBuf,
    mime_type: String,
}

/// Writes each blob to the recordings directory and hands out `file://` URLs.
///
/// PCM blobs are wrapped in a WAV container so the file plays on its own.
/// Revoking a URL deletes the file.
pub struct FileObjectUrls {
    dir: PathBuf,
    files: Mutex<HashMap<String, StoredFile>>,
}

impl FileObjectUrls {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to create recordings directory {:?}: {}", dir, e))?;

        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, blob: &Blob) -> CaptureResult<StoredFile> {
        let id = uuid::Uuid::new_v4();

        if let Some((sample_rate, channels)) = parse_pcm_mime(blob.mime_type()) {
            let path = self.dir.join(format!("{}.wav", id));
            write_wav(&path, blob.data(), sample_rate, channels)?;
            return Ok(StoredFile {
                path,
                mime_type: "audio/wav".to_string(),
            });
        }

        let path = self.dir.join(format!("{}.{}", id, extension(blob.mime_type())));
        fs::write(&path, blob.data())
            .map_err(|e| CaptureError::Artifact(format!("Failed to write {:?}: {}", path, e)))?;

        Ok(StoredFile {
            path,
            mime_type: blob.mime_type().to_string(),
        })
    }
}

impl ObjectUrls for FileObjectUrls {
    fn create_object_url(&self, blob: Blob) -> CaptureResult<String> {
        let stored = self.write(&blob)?;
        let url = format!("file://{}", stored.path.display());
        debug!("Wrote artifact {:?} ({} bytes)", stored.path, blob.size());

        let mut files = self
            .files
            .lock()
            .map_err(|_| CaptureError::Artifact("Object URL table poisoned".to_string()))?;
        files.insert(url.clone(), stored);
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        let stored = match self.files.lock() {
            Ok(mut files) => files.remove(url),
            Err(_) => None,
        };

        if let Some(stored) = stored {
            if let Err(e) = fs::remove_file(&stored.path) {
                warn!("Failed to delete artifact {:?}: {}", stored.path, e);
            }
        }
    }

    fn resolve(&self, url: &str) -> Option<Blob> {
        let (path, mime_type) = {
            let files = self.files.lock().ok()?;
            let stored = files.get(url)?;
            (stored.path.clone(), stored.mime_type.clone())
        };

        match fs::read(&path) {
            Ok(data) => Some(Blob::new(data, mime_type)),
            Err(e) => {
                warn!("Failed to read artifact {:?}: {}", path, e);
                None
            }
        }
    }

    fn live_count(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }
}

fn write_wav(path: &Path, data: &[u8], sample_rate: u32, channels: u16) -> CaptureResult<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let to_err = |e: hound::Error| CaptureError::Artifact(format!("Failed to write {:?}: {}", path, e));

    let mut writer: hound::WavWriter<BufWriter<File>> =
        hound::WavWriter::create(path, spec).map_err(to_err)?;
    for pair in data.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
            .map_err(to_err)?;
    }
    writer.finalize().map_err(to_err)
}

fn extension(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence {
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        _ => "bin",
    }
}
