use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::contact::{ContactEventAdapter, HostEvent};

/// Feeds host SDK events published on NATS into the contact adapter
pub struct ContactEventSubscriber {
    client: Client,
    subject: String,
}

impl ContactEventSubscriber {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject: impl Into<String>) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject: subject.into(),
        })
    }

    /// Connect and subscribe in one step. Either failure is returned so the
    /// caller can fall back to HTTP ingestion.
    pub async fn start(
        url: &str,
        subject: &str,
        adapter: Arc<ContactEventAdapter>,
    ) -> Result<JoinHandle<()>> {
        Self::connect(url, subject).await?.spawn(adapter).await
    }

    /// Subscribe and forward every event until the subscription closes
    pub async fn spawn(self, adapter: Arc<ContactEventAdapter>) -> Result<JoinHandle<()>> {
        let mut subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .context("Failed to subscribe to contact events")?;

        info!("Subscribed to {}", self.subject);

        let client = self.client;
        Ok(tokio::spawn(async move {
            // Keep the connection alive for as long as the subscription runs
            let _client = client;
            while let Some(msg) = subscriber.next().await {
                match parse_event(&msg.payload) {
                    Ok(event) => {
                        debug!("Host event received on {}", msg.subject);
                        adapter.handle(&event);
                    }
                    Err(e) => warn!("Failed to parse host event on {}: {:#}", msg.subject, e),
                }
            }

            info!("Contact event subscription closed");
        }))
    }
}

/// Decode one NATS payload
pub fn parse_event(payload: &[u8]) -> Result<HostEvent> {
    serde_json::from_slice(payload).context("Invalid host event payload")
}
