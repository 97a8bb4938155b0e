use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// One side of a call's audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Local microphone
    Operator,
    /// Remote party
    Customer,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Operator, Channel::Customer];

    /// Label used as a log prefix
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Operator => "Local",
            Channel::Customer => "Remote",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Operator => write!(f, "operator"),
            Channel::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" | "local" => Ok(Channel::Operator),
            "customer" | "remote" => Ok(Channel::Customer),
            other => anyhow::bail!("Unknown channel: {}", other),
        }
    }
}

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the stream started
    pub timestamp_ms: u64,
}

/// Ownership handle to a live audio source.
///
/// Cloning shares the same source. Consumers (recorders, analysers)
/// subscribe and never mutate it, so one microphone stream can be wrapped
/// by a fresh recorder on every call.
#[derive(Debug, Clone)]
pub struct CaptureStream {
    id: String,
    label: String,
    sample_rate: u32,
    channels: u16,
    frames: broadcast::Sender<AudioFrame>,
    ended: Arc<watch::Sender<bool>>,
}

impl CaptureStream {
    pub fn new(label: impl Into<String>, sample_rate: u32, channels: u16) -> Self {
        let (frames, _) = broadcast::channel(256);
        let (ended, _) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.into(),
            sample_rate,
            channels,
            frames,
            ended: Arc::new(ended),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Receive every frame pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AudioFrame> {
        self.frames.subscribe()
    }

    /// Deliver a frame to all current subscribers.
    ///
    /// Returns the number of subscribers that received it.
    pub fn push(&self, frame: AudioFrame) -> usize {
        self.frames.send(frame).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.frames.receiver_count()
    }

    /// Mark the source as finished (remote party hung up, file played out)
    pub fn end(&self) {
        self.ended.send_replace(true);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Watch for the end of the source
    pub fn watch_end(&self) -> watch::Receiver<bool> {
        self.ended.subscribe()
    }
}
