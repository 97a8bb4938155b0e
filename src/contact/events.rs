use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Voice,
    Chat,
    Task,
    #[serde(other)]
    Other,
}

/// Contact lifecycle events emitted by the host softphone SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactEventType {
    Init,
    Refresh,
    Incoming,
    Connecting,
    Pending,
    Accepted,
    Missed,
    Connected,
    Ended,
    Destroyed,
    #[serde(alias = "after_call_work")]
    Acw,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionData {
    pub connection_id: Option<String>,
    pub endpoint: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub connection_type: Option<String>,
    pub is_initial_connection: bool,
}

/// Snapshot of a live contact, as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactData {
    pub original_contact_id: Option<String>,
    pub status: Option<String>,
    pub status_duration_ms: Option<u64>,
    pub queue: Option<String>,
    pub connections: Vec<ConnectionData>,
    pub is_softphone_call: bool,
    pub is_inbound: bool,
    pub attributes: HashMap<String, String>,
}

/// What the host could tell about the contact when the event fired.
///
/// The host adapter decides this; the recorder never inspects a contact
/// object to find out whether it still exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ContactDetails {
    Live(ContactData),
    Destroyed,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostContactEvent {
    pub event_type: ContactEventType,
    pub contact_id: Option<String>,
    pub contact_type: Option<ContactType>,
    #[serde(default)]
    pub details: ContactDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEventType {
    Init,
    Refresh,
    Routable,
    NotRoutable,
    Offline,
    Error,
    AfterCallWork,
    SoftphoneError,
    StateChange,
    MuteToggle,
    ContactPending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostAgentEvent {
    pub event_type: AgentEventType,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub old_state: Option<String>,
    #[serde(default)]
    pub new_state: Option<String>,
    #[serde(default)]
    pub muted: Option<bool>,
    #[serde(default)]
    pub contact_count: Option<usize>,
}

/// Any event delivered by the host SDK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HostEvent {
    Contact(HostContactEvent),
    Agent(HostAgentEvent),
}

/// The two lifecycle signals the session coordinator reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactSignal {
    CallConnected {
        contact_id: String,
        contact_type: ContactType,
    },
    CallEnded {
        contact_id: String,
        contact_type: ContactType,
    },
}

impl ContactSignal {
    pub fn contact_id(&self) -> &str {
        match self {
            ContactSignal::CallConnected { contact_id, .. } => contact_id,
            ContactSignal::CallEnded { contact_id, .. } => contact_id,
        }
    }

    pub fn contact_type(&self) -> ContactType {
        match self {
            ContactSignal::CallConnected { contact_type, .. } => *contact_type,
            ContactSignal::CallEnded { contact_type, .. } => *contact_type,
        }
    }

    pub fn connected(contact_id: impl Into<String>, contact_type: ContactType) -> Self {
        ContactSignal::CallConnected {
            contact_id: contact_id.into(),
            contact_type,
        }
    }

    pub fn ended(contact_id: impl Into<String>, contact_type: ContactType) -> Self {
        ContactSignal::CallEnded {
            contact_id: contact_id.into(),
            contact_type,
        }
    }
}
