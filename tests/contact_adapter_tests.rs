// Integration tests for the contact event adapter
//
// These tests verify that host SDK events are decoded, that only the
// lifecycle events become signals, and that subscribers can come and go.

use anyhow::Result;
use softphone_recorder::contact::{
    normalize, ContactDetails, ContactEventAdapter, ContactEventType, ContactSignal, ContactType,
    HostContactEvent, HostEvent, Observers,
};
use softphone_recorder::nats::{parse_event, ContactEventSubscriber};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn contact_event(event_type: ContactEventType, id: Option<&str>, kind: Option<ContactType>) -> HostEvent {
    HostEvent::Contact(HostContactEvent {
        event_type,
        contact_id: id.map(str::to_string),
        contact_type: kind,
        details: ContactDetails::Unknown,
    })
}

fn recording_adapter() -> (ContactEventAdapter, Arc<Mutex<Vec<ContactSignal>>>) {
    let adapter = ContactEventAdapter::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    adapter.subscribe(move |signal| sink.lock().unwrap().push(signal.clone()));
    (adapter, seen)
}

#[test]
fn test_connected_voice_becomes_call_connected() {
    let (adapter, seen) = recording_adapter();

    let signal = adapter.handle(&contact_event(
        ContactEventType::Connected,
        Some("c1"),
        Some(ContactType::Voice),
    ));

    let expected = ContactSignal::connected("c1", ContactType::Voice);
    assert_eq!(signal, Some(expected.clone()));
    assert_eq!(*seen.lock().unwrap(), vec![expected]);
}

#[test]
fn test_ended_and_destroyed_become_call_ended() {
    let (adapter, seen) = recording_adapter();

    adapter.handle(&contact_event(ContactEventType::Ended, Some("c1"), Some(ContactType::Voice)));
    adapter.handle(&contact_event(
        ContactEventType::Destroyed,
        Some("c1"),
        Some(ContactType::Voice),
    ));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ContactSignal::ended("c1", ContactType::Voice),
            ContactSignal::ended("c1", ContactType::Voice),
        ]
    );
}

#[test]
fn test_informational_events_produce_no_signal() {
    let (adapter, seen) = recording_adapter();

    for event_type in [
        ContactEventType::Init,
        ContactEventType::Refresh,
        ContactEventType::Incoming,
        ContactEventType::Connecting,
        ContactEventType::Pending,
        ContactEventType::Accepted,
        ContactEventType::Missed,
        ContactEventType::Acw,
    ] {
        let signal = adapter.handle(&contact_event(event_type, Some("c1"), Some(ContactType::Voice)));
        assert!(signal.is_none(), "{:?} must not be a lifecycle signal", event_type);
    }

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_missing_contact_id_is_dropped() {
    let (adapter, seen) = recording_adapter();

    assert!(adapter
        .handle(&contact_event(ContactEventType::Connected, None, Some(ContactType::Voice)))
        .is_none());
    assert!(adapter
        .handle(&contact_event(ContactEventType::Ended, Some(""), Some(ContactType::Voice)))
        .is_none());

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_missing_contact_type_maps_to_other() {
    let event = HostContactEvent {
        event_type: ContactEventType::Connected,
        contact_id: Some("c9".to_string()),
        contact_type: None,
        details: ContactDetails::Destroyed,
    };

    let signal = normalize(&event).expect("signal");
    assert_eq!(signal.contact_type(), ContactType::Other);
    assert_eq!(signal.contact_id(), "c9");
}

#[test]
fn test_agent_events_are_informational() -> Result<()> {
    let (adapter, seen) = recording_adapter();

    let event = parse_event(br#"{"kind":"agent","event_type":"state_change","new_state":"Available"}"#)?;
    assert!(adapter.handle(&event).is_none());
    assert!(seen.lock().unwrap().is_empty());

    Ok(())
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let adapter = ContactEventAdapter::new();
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    let subscription = adapter.subscribe(move |_| *sink.lock().unwrap() += 1);
    assert_eq!(adapter.subscriber_count(), 1);

    let connected = contact_event(ContactEventType::Connected, Some("c1"), Some(ContactType::Voice));
    adapter.handle(&connected);
    assert!(adapter.unsubscribe(subscription));
    adapter.handle(&connected);

    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(adapter.subscriber_count(), 0);
}

#[test]
fn test_observers_notify_in_subscription_order() {
    let observers: Observers<u32> = Observers::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&order);
    let a = observers.subscribe(move |v| first.lock().unwrap().push(("a", *v)));
    let second = Arc::clone(&order);
    let _b = observers.subscribe(move |v| second.lock().unwrap().push(("b", *v)));

    observers.notify(&1);
    assert!(observers.unsubscribe(a));
    observers.notify(&2);

    assert_eq!(*order.lock().unwrap(), vec![("a", 1), ("b", 1), ("b", 2)]);
    assert_eq!(observers.len(), 1);
    assert!(!observers.is_empty());
}

#[test]
fn test_parse_live_contact_payload() -> Result<()> {
    let payload = br#"{
        "kind": "contact",
        "event_type": "connected",
        "contact_id": "c1",
        "contact_type": "voice",
        "details": {
            "state": "live",
            "status": "connected",
            "queue": "support",
            "is_softphone_call": true,
            "connections": [{"connection_id": "a1", "type": "inbound", "is_initial_connection": true}]
        }
    }"#;

    let event = parse_event(payload)?;
    let HostEvent::Contact(contact) = &event else {
        panic!("Expected a contact event");
    };

    assert_eq!(contact.event_type, ContactEventType::Connected);
    match &contact.details {
        ContactDetails::Live(data) => {
            assert_eq!(data.queue.as_deref(), Some("support"));
            assert!(data.is_softphone_call);
            assert_eq!(data.connections.len(), 1);
            assert_eq!(data.connections[0].connection_type.as_deref(), Some("inbound"));
        }
        other => panic!("Unexpected details: {:?}", other),
    }

    Ok(())
}

#[test]
fn test_parse_destroyed_and_unknown_contact_type() -> Result<()> {
    let event = parse_event(
        br#"{"kind":"contact","event_type":"destroyed","contact_id":"c1","contact_type":"queue_callback","details":{"state":"destroyed"}}"#,
    )?;

    let HostEvent::Contact(contact) = event else {
        panic!("Expected a contact event");
    };
    assert_eq!(contact.contact_type, Some(ContactType::Other));
    assert_eq!(contact.details, ContactDetails::Destroyed);

    // Details are optional
    let event = parse_event(br#"{"kind":"contact","event_type":"after_call_work","contact_id":"c1"}"#)?;
    let HostEvent::Contact(contact) = event else {
        panic!("Expected a contact event");
    };
    assert_eq!(contact.event_type, ContactEventType::Acw);
    assert_eq!(contact.details, ContactDetails::Unknown);
    assert!(contact.contact_type.is_none());

    Ok(())
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_event(b"not json").is_err());
    assert!(parse_event(br#"{"kind":"contact"}"#).is_err());
}

#[tokio::test]
async fn test_unreachable_nats_returns_error() -> Result<()> {
    let adapter = Arc::new(ContactEventAdapter::new());

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        ContactEventSubscriber::start("nats://127.0.0.1:1", "contact.events.>", adapter),
    )
    .await?;

    assert!(result.is_err(), "Startup failure is reported, not fatal");
    Ok(())
}
