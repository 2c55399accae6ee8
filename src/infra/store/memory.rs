//! In-memory user and event stores.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::NaiveDateTime;
use parking_lot::RwLock;

use crate::core::{Event, EventId, EventStore, NotifyError, User, UserId, UserStore};

/// User records held in memory, listed in id order.
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<UserId, User>>,
    next_id: AtomicI64,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryUserStore {
    /// Create an empty store; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn list_all(&self) -> Result<Vec<User>, NotifyError> {
        Ok(self.users.read().values().cloned().collect())
    }

    fn find_by_id(&self, id: UserId) -> Result<Option<User>, NotifyError> {
        Ok(self.users.read().get(&id).cloned())
    }

    fn insert(&self, full_name: String, notification_schedule: Option<String>) -> Result<User, NotifyError> {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            full_name,
            notification_schedule,
        };
        self.users.write().insert(user.id, user.clone());
        Ok(user)
    }

    fn update(&self, user: User) -> Result<(), NotifyError> {
        let mut users = self.users.write();
        let slot = users
            .get_mut(&user.id)
            .ok_or_else(|| NotifyError::user_not_found(user.id))?;
        *slot = user;
        Ok(())
    }

    fn delete(&self, id: UserId) -> Result<bool, NotifyError> {
        Ok(self.users.write().remove(&id).is_some())
    }
}

/// Event records held in memory, listed in id order.
pub struct InMemoryEventStore {
    events: RwLock<BTreeMap<EventId, Event>>,
    next_id: AtomicI64,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryEventStore {
    /// Create an empty store; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn insert(&self, message: String, occurred_at: NaiveDateTime) -> Result<Event, NotifyError> {
        let event = Event {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message,
            occurred_at,
        };
        self.events.write().insert(event.id, event.clone());
        Ok(event)
    }

    fn find_by_id(&self, id: EventId) -> Result<Option<Event>, NotifyError> {
        Ok(self.events.read().get(&id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Event>, NotifyError> {
        Ok(self.events.read().values().cloned().collect())
    }

    fn delete(&self, id: EventId) -> Result<bool, NotifyError> {
        Ok(self.events.write().remove(&id).is_some())
    }
}
