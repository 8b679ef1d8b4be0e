//! Stream event types.
//!
//! A streamed chat or generate call produces a sequence of [`StreamEvent`]s
//! ending (normally) with a `done` event. Event kinds the crate does not know
//! about are kept as [`EventKind::Other`] and forwarded unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{null_as_default, References};

/// Discriminator of a stream event (the wire `type` field).
///
/// Never empty: an empty `type` fails to deserialize, so such a payload is
/// dropped like any other malformed line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    /// Incremental text
    Token,
    /// Sentinel marking the normal end of the stream
    Done,
    /// Citation mapping for markers in the generated text
    References,
    /// Any kind this crate does not model
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Token => "token",
            EventKind::Done => "done",
            EventKind::References => "references",
            EventKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for EventKind {
    type Error = String;

    fn try_from(kind: String) -> Result<Self, Self::Error> {
        match kind.as_str() {
            "" => Err("event type must not be empty".to_string()),
            "token" => Ok(EventKind::Token),
            "done" => Ok(EventKind::Done),
            "references" => Ok(EventKind::References),
            _ => Ok(EventKind::Other(kind)),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

/// One event from a streamed chat or document generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Text fragment, set on `token` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Session id to pass back as `chat_id` to continue the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "References::is_empty"
    )]
    pub references: References,
}

impl StreamEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            content: None,
            chat_id: None,
            references: References::new(),
        }
    }

    pub fn token(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(EventKind::Token)
        }
    }

    pub fn done() -> Self {
        Self::new(EventKind::Done)
    }

    /// Build an event from a decoded `data:` payload.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }

    pub fn is_done(&self) -> bool {
        self.kind == EventKind::Done
    }

    pub fn is_token(&self) -> bool {
        self.kind == EventKind::Token
    }

    /// Text carried by this event, empty if none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}
