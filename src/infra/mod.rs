//! Infrastructure adapters for pending queues, push channels, and record stores.

pub mod push;
pub mod queue;
pub mod store;

pub use push::{FilePushChannel, InMemoryPushChannel, OutboxMessage};
#[cfg(feature = "tokio-runtime")]
pub use push::SessionPushChannel;
pub use queue::{FilePendingQueue, InMemoryPendingQueue};
pub use store::{InMemoryEventStore, InMemoryUserStore};
