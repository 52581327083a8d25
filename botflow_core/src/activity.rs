//! Inbound turn payloads.
//!
//! An [`Activity`] is one inbound conversational event. The pipeline treats
//! its content as opaque; only `conversation_id` is interpreted, to route
//! the turn to the right state entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of inbound event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A user-authored message.
    Message,
    /// A conversation lifecycle event (joined, left, ...).
    Event,
}

/// One inbound conversational event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Activity identifier
    pub id: Uuid,
    /// Conversation this activity belongs to
    pub conversation_id: String,
    /// Event kind
    pub kind: ActivityKind,
    /// Message text, if any
    pub text: Option<String>,
    /// Channel-specific payload, opaque to the pipeline
    #[serde(default)]
    pub payload: serde_json::Value,
    /// When the activity was received
    pub received_at: DateTime<Utc>,
}

impl Activity {
    /// Create a message activity for a conversation.
    #[must_use]
    pub fn message(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id: conversation_id.into(),
            kind: ActivityKind::Message,
            text: Some(text.into()),
            payload: serde_json::Value::Null,
            received_at: Utc::now(),
        }
    }

    /// Create an event activity for a conversation.
    #[must_use]
    pub fn event(conversation_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id: conversation_id.into(),
            kind: ActivityKind::Event,
            text: None,
            payload,
            received_at: Utc::now(),
        }
    }

    /// Attach a channel payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
