//! Audit sink implementations.
//!
//! Provides a bounded in-memory trail and a JSON-lines file trail for delivery auditing.

use std::collections::VecDeque;
use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::model::{EventId, UserId};
use crate::core::NotifyError;

/// What happened to a user/event pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Pushed to the user.
    Delivered,
    /// Parked in the pending queue.
    Queued,
    /// Processing for the user failed.
    Failed,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Audit record identifier.
    pub audit_id: String,
    /// Recipient.
    pub user_id: UserId,
    /// Recipient display name.
    pub user_name: String,
    /// Event concerned.
    pub event_id: EventId,
    /// Action taken.
    pub action: AuditAction,
    /// Local wall-clock time of the action.
    pub recorded_at: NaiveDateTime,
    /// Message text or failure reason.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Append-only JSON-lines audit file.
pub struct JsonLinesAuditSink {
    file_path: PathBuf,
}

impl JsonLinesAuditSink {
    /// Open (creating the directory if needed) `<dir>/<stream>_audit.jsonl`.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Backend`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>, stream: &str) -> Result<Self, NotifyError> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(|e| NotifyError::Backend(e.to_string()))?;
        Ok(Self {
            file_path: dir.join(format!("{stream}_audit.jsonl")),
        })
    }

    /// Path of the audit file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn append(&self, event: &AuditEvent) -> Result<(), NotifyError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| NotifyError::Backend(e.to_string()))?;
        let line = serde_json::to_string(event).map_err(|e| NotifyError::Backend(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| NotifyError::Backend(e.to_string()))
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if let Err(e) = self.append(&event) {
            tracing::warn!("failed to append audit record {}: {}", event.audit_id, e);
        }
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    user_id: UserId,
    user_name: impl Into<String>,
    event_id: EventId,
    action: AuditAction,
    recorded_at: NaiveDateTime,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        audit_id: uuid::Uuid::new_v4().to_string(),
        user_id,
        user_name: user_name.into(),
        event_id,
        action,
        recorded_at,
        detail,
    }
}
