//! Realtime message envelope
//!
//! Frames pushed by the edge server over `/ws`:
//!
//! ```json
//! { "type": "data_update", "data": { "entity": "reservations" } }
//! ```
//!
//! The payload is never trusted as a source of counts; a recount-relevant
//! frame only tells the client to fetch a fresh snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame types that invalidate the notification counts
const RECOUNT_TYPES: &[&str] = &[
    "notification",
    "data_update",
    "notification_count",
    "notifications_update",
    "new_reservation",
    "reservation_update",
    "new_order",
    "order_update",
    "new_message",
    "stock_alert",
];

/// Connection lifecycle frame types
const LIFECYCLE_TYPES: &[&str] = &["connected", "welcome", "ping", "pong", "heartbeat", "error"];

/// Inbound realtime frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Classification of an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Counts may have changed, schedule a recount
    Recount,
    /// Connection lifecycle (welcome, heartbeat, server error notice)
    Lifecycle,
    /// Unrecognized type, ignored
    Ignored,
}

impl RealtimeEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn kind(&self) -> EventKind {
        let t = self.event_type.as_str();
        if RECOUNT_TYPES.contains(&t) {
            EventKind::Recount
        } else if LIFECYCLE_TYPES.contains(&t) {
            EventKind::Lifecycle
        } else {
            EventKind::Ignored
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Recount => write!(f, "recount"),
            EventKind::Lifecycle => write!(f, "lifecycle"),
            EventKind::Ignored => write!(f, "ignored"),
        }
    }
}
