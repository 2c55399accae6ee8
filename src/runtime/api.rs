//! API-facing request/response models and entry helpers.
//!
//! Schedules arrive as raw JSON and are normalized before anything is persisted;
//! views render the stored schedule with the formatter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::codec::normalize;
use crate::core::{
    export_schedule, Event, EventDispatcher, NotifyError, PendingQueue, PushChannel, User, UserId,
    UserStore,
};

/// User registration or update payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    /// Display name.
    pub full_name: String,
    /// Raw weekly schedule object, keys in any case.
    #[serde(default)]
    pub notification_schedule: Option<Value>,
}

/// User as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Human-readable schedule; `None` when no schedule is stored.
    pub notification_schedule: Option<String>,
}

/// Event creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    /// Text to push.
    pub message: String,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

fn normalized(req: &UserRequest) -> Result<Option<String>, NotifyError> {
    req.notification_schedule.as_ref().map(normalize).transpose()
}

/// Render a user with its formatted schedule.
///
/// # Errors
///
/// [`NotifyError::ScheduleFormat`] when the stored schedule is corrupt.
pub fn user_view(user: &User) -> Result<UserResponse, NotifyError> {
    Ok(UserResponse {
        id: user.id,
        full_name: user.full_name.clone(),
        notification_schedule: export_schedule(user.notification_schedule.as_deref())?,
    })
}

/// Normalize the schedule and persist a new user.
///
/// # Errors
///
/// [`NotifyError::Validation`] for a bad schedule, in which case nothing is stored.
pub fn register_user(store: &dyn UserStore, req: UserRequest) -> Result<UserResponse, NotifyError> {
    let schedule = normalized(&req)?;
    let user = store.insert(req.full_name, schedule)?;
    tracing::info!("user {} registered", user.id);
    user_view(&user)
}

/// Normalize the schedule and overwrite an existing user.
///
/// # Errors
///
/// [`NotifyError::NotFound`] for an unknown id, [`NotifyError::Validation`] for a
/// bad schedule. Either way the stored user is unchanged.
pub fn update_user(
    store: &dyn UserStore,
    id: UserId,
    req: UserRequest,
) -> Result<UserResponse, NotifyError> {
    let mut user = store
        .find_by_id(id)?
        .ok_or_else(|| NotifyError::user_not_found(id))?;
    user.notification_schedule = normalized(&req)?;
    user.full_name = req.full_name;
    store.update(user.clone())?;
    tracing::info!("user {} updated", user.id);
    user_view(&user)
}

/// All users with formatted schedules.
///
/// # Errors
///
/// Store failures or a corrupt stored schedule.
pub fn list_users(store: &dyn UserStore) -> Result<Vec<UserResponse>, NotifyError> {
    store.list_all()?.iter().map(user_view).collect()
}

/// One user with formatted schedule, `None` if unknown.
///
/// # Errors
///
/// Store failures or a corrupt stored schedule.
pub fn find_user(store: &dyn UserStore, id: UserId) -> Result<Option<UserResponse>, NotifyError> {
    store.find_by_id(id)?.as_ref().map(user_view).transpose()
}

/// Users active right now, with formatted schedules.
///
/// # Errors
///
/// Store failures.
pub fn active_users<Q, C>(dispatcher: &EventDispatcher<Q, C>) -> Result<Vec<UserResponse>, NotifyError>
where
    Q: PendingQueue,
    C: PushChannel + ?Sized,
{
    dispatcher.active_users()?.iter().map(user_view).collect()
}

/// Persist and dispatch an event.
///
/// # Errors
///
/// Only failures to persist the event.
pub async fn create_event<Q, C>(
    dispatcher: &EventDispatcher<Q, C>,
    req: EventRequest,
) -> Result<Event, NotifyError>
where
    Q: PendingQueue,
    C: PushChannel + ?Sized,
{
    dispatcher.create_event(req.message).await
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}
