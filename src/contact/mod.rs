//! Contact Event Adapter
//!
//! Boundary with the host softphone SDK. Host events arrive as JSON
//! (`HostEvent`), are logged, and the lifecycle ones are turned into
//! `ContactSignal`s for the session coordinator.

mod adapter;
mod events;
mod observers;

pub use adapter::{normalize, ContactEventAdapter};
pub use events::{
    AgentEventType, ConnectionData, ContactData, ContactDetails, ContactEventType, ContactSignal,
    ContactType, HostAgentEvent, HostContactEvent, HostEvent,
};
pub use observers::{Observers, Subscription};
