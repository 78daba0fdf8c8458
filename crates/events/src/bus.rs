//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PipelineEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use blusanta_core::types::DbId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::payloads::EventPayload;

// ---------------------------------------------------------------------------
// PipelineEvent
// ---------------------------------------------------------------------------

/// Something that happened to an assessment.
///
/// Constructed via [`PipelineEvent::new`] and the builder methods, or from a
/// typed payload with [`PipelineEvent::from_payload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Dot-separated event name, e.g. `"assessment.submitted"`.
    pub event_type: String,

    /// The assessment concerned. `None` for rejected submissions, which
    /// never reach the store.
    pub assessment_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            assessment_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_assessment(mut self, id: DbId) -> Self {
        self.assessment_id = Some(id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Build an event whose type and payload come from `payload`.
    pub fn from_payload<P: EventPayload>(payload: &P) -> Self {
        let value = serde_json::to_value(payload).unwrap_or_default();
        Self::new(P::EVENT_TYPE).with_payload(value)
    }

    /// Decode the payload if this event is of type `P`.
    pub fn decode<P: EventPayload + DeserializeOwned>(&self) -> Option<P> {
        if self.event_type != P::EVENT_TYPE {
            return None;
        }
        match serde_json::from_value(self.payload.clone()) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(
                    event_type = %self.event_type,
                    error = %e,
                    "Malformed event payload"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PipelineEvent`].
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PipelineEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
