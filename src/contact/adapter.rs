use tracing::{debug, warn};

use super::events::{
    ContactDetails, ContactEventType, ContactSignal, ContactType, HostAgentEvent, HostContactEvent,
    HostEvent,
};
use super::observers::{Observers, Subscription};

/// Normalizes host SDK events into `callConnected` / `callEnded` signals
/// and fans them out to subscribers.
#[derive(Default)]
pub struct ContactEventAdapter {
    observers: Observers<ContactSignal>,
}

impl ContactEventAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ContactSignal) + Send + Sync + 'static,
    {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.observers.unsubscribe(subscription)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Log a host event and publish the signal it maps to, if any
    pub fn handle(&self, event: &HostEvent) -> Option<ContactSignal> {
        match event {
            HostEvent::Agent(agent) => {
                log_agent_event(agent);
                None
            }
            HostEvent::Contact(contact) => {
                log_contact_event(contact);
                let signal = normalize(contact)?;
                self.observers.notify(&signal);
                Some(signal)
            }
        }
    }
}

/// Map a contact event to a lifecycle signal.
///
/// Only `connected` starts and only `ended`/`destroyed` stop; every other
/// event is informational.
pub fn normalize(event: &HostContactEvent) -> Option<ContactSignal> {
    let is_lifecycle = matches!(
        event.event_type,
        ContactEventType::Connected | ContactEventType::Ended | ContactEventType::Destroyed
    );
    if !is_lifecycle {
        return None;
    }

    let Some(contact_id) = event.contact_id.clone().filter(|id| !id.is_empty()) else {
        warn!(
            "Dropped contact event without contact ID. (Event type: {:?})",
            event.event_type
        );
        return None;
    };

    let contact_type = event.contact_type.unwrap_or(ContactType::Other);

    match event.event_type {
        ContactEventType::Connected => Some(ContactSignal::CallConnected {
            contact_id,
            contact_type,
        }),
        _ => Some(ContactSignal::CallEnded {
            contact_id,
            contact_type,
        }),
    }
}

fn log_contact_event(event: &HostContactEvent) {
    let details = match &event.details {
        ContactDetails::Live(data) => serde_json::to_string(data).unwrap_or_default(),
        ContactDetails::Destroyed => "destroyed".to_string(),
        ContactDetails::Unknown => "unknown".to_string(),
    };

    debug!(
        "Contact event. (Event type: {:?}, Contact ID: {}, Type: {:?}) {}",
        event.event_type,
        event.contact_id.as_deref().unwrap_or("-"),
        event.contact_type,
        details
    );
}

fn log_agent_event(event: &HostAgentEvent) {
    debug!(
        "Agent event. (Event type: {:?}) {}",
        event.event_type,
        serde_json::to_string(event).unwrap_or_default()
    );
}
