//! Records the dispatch engine reads and writes.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// User identifier.
pub type UserId = i64;

/// Event identifier.
pub type EventId = i64;

/// A recipient with a weekly availability schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Canonical schedule text; `None` means never active.
    pub notification_schedule: Option<String>,
}

/// Something that happened and should reach every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier.
    pub id: EventId,
    /// Text pushed to users.
    pub message: String,
    /// Local wall-clock creation time.
    pub occurred_at: NaiveDateTime,
}

/// Unique key of a pending delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingKey {
    /// Recipient.
    pub user_id: UserId,
    /// Queued event.
    pub event_id: EventId,
}

impl fmt::Display for PendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} / event {}", self.user_id, self.event_id)
    }
}

/// An event still owed to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelivery {
    /// Unique (user, event) pair.
    pub key: PendingKey,
    /// When the user was found inactive.
    pub enqueued_at: NaiveDateTime,
}

impl PendingDelivery {
    /// Create an entry for a user/event pair.
    #[must_use]
    pub const fn new(user_id: UserId, event_id: EventId, enqueued_at: NaiveDateTime) -> Self {
        Self {
            key: PendingKey { user_id, event_id },
            enqueued_at,
        }
    }
}

/// Per-user push address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// Owner of the destination.
    pub user_id: UserId,
}

impl Destination {
    /// Destination for a user.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/queue/user/{}", self.user_id)
    }
}

/// Tagged payload sent over a push channel.
///
/// Consumers switch on `type`, so new kinds can be added without breaking them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// An event notification.
    Event {
        /// Event text.
        message: String,
    },
}

impl PushMessage {
    /// Message for an event.
    #[must_use]
    pub fn for_event(event: &Event) -> Self {
        Self::Event {
            message: event.message.clone(),
        }
    }

    /// Text carried by the message.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Event { message } => message,
        }
    }
}
