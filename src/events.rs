//! Event publication.
//!
//! Events are published as JSON objects carrying a `metadata` member that
//! names the entity, the event and its version. [`publish_event`] builds
//! that object from any [`PublishableEvent`]; an [`EventPublisher`] ships it.

use crate::rest::RestClient;
use crate::request_error;
use crate::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Member name under which metadata is attached to a published event
pub const METADATA_FIELD: &str = "metadata";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub entity_name: String,
    pub event_name: String,
    pub major_version: u32,
    pub minor_version: u32,
}

impl EventMetadata {
    pub fn new(
        entity_name: impl Into<String>,
        event_name: impl Into<String>,
        major_version: u32,
        minor_version: u32,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            event_name: event_name.into(),
            major_version,
            minor_version,
        }
    }
}

/// An event type that knows its own metadata
pub trait PublishableEvent: Serialize {
    fn metadata(&self) -> EventMetadata;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`. Returns `Cancelled` if `cancel` fires first.
    async fn publish(&self, event: serde_json::Value, cancel: CancellationToken) -> NexusResult<()>;
}

/// Serialize `event`, attach its metadata and publish it
pub async fn publish_event<E: PublishableEvent>(
    publisher: &dyn EventPublisher,
    event: &E,
    cancel: CancellationToken,
) -> NexusResult<()> {
    let mut value = serde_json::to_value(event)?;
    let metadata = serde_json::to_value(event.metadata())?;
    match value.as_object_mut() {
        Some(object) => {
            object.insert(METADATA_FIELD.to_string(), metadata);
        }
        None => {
            return Err(NexusError::Validation(
                "events must serialize to a JSON object".to_string(),
            ))
        }
    }
    publisher.publish(value, cancel).await
}

/// Read the metadata attached by [`publish_event`]
pub fn metadata_of(event: &serde_json::Value) -> Option<EventMetadata> {
    event
        .get(METADATA_FIELD)
        .and_then(|m| serde_json::from_value(m.clone()).ok())
}

/// Publishes by posting to `Events` under the client's endpoint root
pub struct RestEventPublisher {
    client: Arc<RestClient>,
}

impl RestEventPublisher {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for RestEventPublisher {
    async fn publish(&self, event: serde_json::Value, cancel: CancellationToken) -> NexusResult<()> {
        if cancel.is_cancelled() {
            return Err(NexusError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NexusError::Cancelled),
            result = self.client.post(&["Events"], &event) => result,
        }
    }
}

/// Publishes into a bounded in-process channel
#[derive(Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<serde_json::Value>,
}

impl ChannelEventPublisher {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<serde_json::Value>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: serde_json::Value, cancel: CancellationToken) -> NexusResult<()> {
        if cancel.is_cancelled() {
            return Err(NexusError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NexusError::Cancelled),
            sent = self.sender.send(event) => sent.map_err(|_| request_error!("event channel is closed")),
        }
    }
}
