//! In-memory push outbox.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Destination, NotifyError, PushChannel, PushMessage};
use crate::infra::push::{select, OutboxMessage};
use crate::util::clock::now_ms;

/// Simple in-memory outbox for development/testing.
#[derive(Default)]
pub struct InMemoryPushChannel {
    messages: Mutex<HashMap<Destination, Vec<OutboxMessage>>>,
}

impl InMemoryPushChannel {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch messages pushed to a destination, optionally since a timestamp.
    #[must_use]
    pub fn fetch(
        &self,
        destination: &Destination,
        since_ms: Option<u128>,
        limit: usize,
    ) -> Vec<OutboxMessage> {
        select(self.messages.lock().get(destination), since_ms, limit)
    }

    /// Message texts pushed to a user, oldest first.
    #[must_use]
    pub fn texts_for(&self, user_id: i64) -> Vec<String> {
        self.fetch(&Destination::user(user_id), None, usize::MAX)
            .into_iter()
            .map(|m| m.message.text().to_string())
            .collect()
    }

    /// Total messages pushed across destinations.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.messages.lock().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl PushChannel for InMemoryPushChannel {
    async fn send(&self, destination: &Destination, message: PushMessage) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .entry(*destination)
            .or_default()
            .push(OutboxMessage {
                message,
                sent_at_ms: now_ms(),
            });
        Ok(())
    }
}
