pub mod client;

pub use client::{parse_event, ContactEventSubscriber};
