//! Record stores the dispatcher consumes.
//!
//! Implementations own persistence; the dispatcher only lists users, reads events,
//! and writes back normalized schedules through these traits.

use chrono::NaiveDateTime;

use crate::core::model::{Event, EventId, User, UserId};
use crate::core::NotifyError;

/// User records.
pub trait UserStore: Send + Sync {
    /// Every user, no pagination.
    fn list_all(&self) -> Result<Vec<User>, NotifyError>;
    /// Look a user up by id.
    fn find_by_id(&self, id: UserId) -> Result<Option<User>, NotifyError>;
    /// Persist a new user and return it with its assigned id.
    fn insert(&self, full_name: String, notification_schedule: Option<String>) -> Result<User, NotifyError>;
    /// Overwrite an existing user.
    fn update(&self, user: User) -> Result<(), NotifyError>;
    /// Remove a user, `true` if it existed.
    fn delete(&self, id: UserId) -> Result<bool, NotifyError>;
}

/// Event records.
pub trait EventStore: Send + Sync {
    /// Persist a new event and return it with its assigned id.
    fn insert(&self, message: String, occurred_at: NaiveDateTime) -> Result<Event, NotifyError>;
    /// Look an event up by id.
    fn find_by_id(&self, id: EventId) -> Result<Option<Event>, NotifyError>;
    /// Every event.
    fn list_all(&self) -> Result<Vec<Event>, NotifyError>;
    /// Remove an event, `true` if it existed.
    fn delete(&self, id: EventId) -> Result<bool, NotifyError>;
}
