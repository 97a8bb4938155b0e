use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capture::Channel;
use crate::recorder::Artifact;

/// Coordinator state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording {
        contact_id: String,
        started_at: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn contact_id(&self) -> Option<&str> {
        match self {
            SessionState::Idle => None,
            SessionState::Recording { contact_id, .. } => Some(contact_id),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording { .. })
    }
}

/// Snapshot published after every signal and device state change
#[derive(Debug, Clone, Serialize, Default)]
pub struct SessionStatus {
    pub session: SessionState,
    pub recording_enabled: bool,
    pub device_state: String,
    pub sessions_started: u64,
    pub operator_artifact: Option<Artifact>,
    pub customer_artifact: Option<Artifact>,
}

/// Why a signal left the state untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    RecordingDisabled,
    NotVoice,
    AlreadyRecording,
    ContactMismatch { active_contact_id: String },
    NotRecording,
}

/// Notifications emitted by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        contact_id: String,
        channels: Vec<Channel>,
    },
    ChannelStopped {
        contact_id: String,
        channel: Channel,
        artifact: Option<Artifact>,
    },
    Stopped {
        contact_id: String,
    },
    Ignored {
        contact_id: String,
        reason: IgnoreReason,
    },
}
