//! Error types for dispatch operations.

use thiserror::Error;

use crate::core::model::{EventId, UserId};

/// Errors produced by the schedule codec, dispatcher, and backends.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Raw schedule rejected at the write boundary.
    #[error("invalid schedule: {0}")]
    Validation(String),
    /// Stored schedule text could not be decoded.
    #[error("malformed stored schedule: {0}")]
    ScheduleFormat(String),
    /// A referenced record no longer exists.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },
    /// Push delivery failed.
    #[error("push delivery failed: {0}")]
    Transport(String),
    /// A pending entry for the pair already exists.
    #[error("pending delivery already exists for user {user_id} and event {event_id}")]
    DuplicatePending {
        /// User half of the pair.
        user_id: UserId,
        /// Event half of the pair.
        event_id: EventId,
    },
    /// Queue is full.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl NotifyError {
    /// Missing event referenced by a pending entry.
    #[must_use]
    pub const fn event_not_found(id: EventId) -> Self {
        Self::NotFound { entity: "event", id }
    }

    /// Missing user.
    #[must_use]
    pub const fn user_not_found(id: UserId) -> Self {
        Self::NotFound { entity: "user", id }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
