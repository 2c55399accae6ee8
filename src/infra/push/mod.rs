//! Push channel backends.

pub mod file;
pub mod memory;
#[cfg(feature = "tokio-runtime")]
pub mod session;

use serde::{Deserialize, Serialize};

use crate::core::PushMessage;

pub use file::FilePushChannel;
pub use memory::InMemoryPushChannel;
#[cfg(feature = "tokio-runtime")]
pub use session::SessionPushChannel;

/// Message recorded by an outbox channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Payload that was pushed.
    pub message: PushMessage,
    /// Timestamp milliseconds.
    pub sent_at_ms: u128,
}

pub(crate) fn select(
    messages: Option<&Vec<OutboxMessage>>,
    since_ms: Option<u128>,
    limit: usize,
) -> Vec<OutboxMessage> {
    messages
        .map(|msgs| {
            msgs.iter()
                .filter(|m| since_ms.is_none_or(|s| m.sent_at_ms >= s))
                .take(limit)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
