//! Live session fan-out.
//!
//! A connected client subscribes with its user id and receives every message pushed
//! to that user's destination while the receiver is alive. A user may hold several
//! sessions at once; closed sessions are pruned on the next push. Pushing to a user
//! with no session succeeds and the message is dropped, as with any fire-and-forget
//! broker.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::{Destination, NotifyError, PushChannel, PushMessage, UserId};

/// Per-user live push channel.
#[derive(Default)]
pub struct SessionPushChannel {
    sessions: Mutex<HashMap<UserId, Vec<mpsc::UnboundedSender<PushMessage>>>>,
}

impl SessionPushChannel {
    /// Create a channel with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a user.
    pub fn subscribe(&self, user_id: UserId) -> mpsc::UnboundedReceiver<PushMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().entry(user_id).or_default().push(tx);
        tracing::debug!("session opened for user {}", user_id);
        rx
    }

    /// Live sessions of a user.
    #[must_use]
    pub fn session_count(&self, user_id: UserId) -> usize {
        self.sessions
            .lock()
            .get(&user_id)
            .map_or(0, |s| s.iter().filter(|tx| !tx.is_closed()).count())
    }
}

#[async_trait]
impl PushChannel for SessionPushChannel {
    async fn send(&self, destination: &Destination, message: PushMessage) -> Result<(), NotifyError> {
        let mut sessions = self.sessions.lock();
        let Some(live) = sessions.get_mut(&destination.user_id) else {
            tracing::debug!("no session for {}, message dropped", destination);
            return Ok(());
        };
        live.retain(|tx| tx.send(message.clone()).is_ok());
        if live.is_empty() {
            sessions.remove(&destination.user_id);
        }
        Ok(())
    }
}
