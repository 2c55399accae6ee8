//! Core schedule model, delivery engine, and the traits backends implement.

pub mod error;
pub mod weekday;
pub mod schedule;
pub mod codec;
pub mod activity;
pub mod formatter;
pub mod model;
pub mod store;
pub mod audit;
pub mod dispatcher;
#[cfg(feature = "tokio-runtime")]
pub mod sweeper;

pub use error::{AppResult, NotifyError};
pub use weekday::Weekday;
pub use schedule::{Schedule, TimeInterval};
pub use activity::{is_active, is_user_active};
pub use formatter::{export_schedule, format_schedule};
pub use model::{Destination, Event, EventId, PendingDelivery, PendingKey, PushMessage, User, UserId};
pub use store::{EventStore, UserStore};
pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, JsonLinesAuditSink,
};
pub use dispatcher::{
    ActiveScan, DispatchReport, EventDispatcher, PendingQueue, PushChannel, UserFailure,
};
#[cfg(feature = "tokio-runtime")]
pub use sweeper::{Spawn, SweepReport, Sweeper, SweeperHandle};
