//! Runtime adapters and API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use api::{
    active_users, create_event, find_user, health, list_users, register_user, update_user, user_view,
    EventRequest, Health, UserRequest, UserResponse,
};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
