//! Event dispatcher and the queue/channel traits it drives.
//!
//! A new event is fanned out to every user: active users get an immediate push,
//! inactive users get a pending entry. Flushing a user walks their pending entries,
//! pushes each event, and removes the entry only after the push returned.
//!
//! Pushes always happen after the event has been persisted and outside any queue
//! lock, so a slow transport never holds up storage. A failed delete after a
//! successful push means the entry is delivered again on the next flush
//! (at-least-once).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::activity::is_user_active;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::model::{
    Destination, Event, EventId, PendingDelivery, PendingKey, PushMessage, User, UserId,
};
use crate::core::store::{EventStore, UserStore};
use crate::core::NotifyError;
use crate::util::clock::Clock;

/// Durable store of pending (user, event) deliveries.
pub trait PendingQueue: Send {
    /// Add an entry. The (user, event) pair must not already be queued.
    fn insert(&mut self, entry: PendingDelivery) -> Result<(), NotifyError>;
    /// All entries for a user, in the backend's natural order.
    fn find_by_user(&self, user_id: UserId) -> Result<Vec<PendingDelivery>, NotifyError>;
    /// Remove an entry, `true` if it was present.
    fn delete(&mut self, key: &PendingKey) -> Result<bool, NotifyError>;
    /// Maximum number of entries held.
    fn max_depth(&self) -> usize;
    /// Current number of entries.
    fn len(&self) -> usize;
    /// True when nothing is queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Q: PendingQueue + ?Sized> PendingQueue for Box<Q> {
    fn insert(&mut self, entry: PendingDelivery) -> Result<(), NotifyError> {
        (**self).insert(entry)
    }

    fn find_by_user(&self, user_id: UserId) -> Result<Vec<PendingDelivery>, NotifyError> {
        (**self).find_by_user(user_id)
    }

    fn delete(&mut self, key: &PendingKey) -> Result<bool, NotifyError> {
        (**self).delete(key)
    }

    fn max_depth(&self) -> usize {
        (**self).max_depth()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Fire-and-forget per-user push transport.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Send a message to a destination. No acknowledgement is read back.
    async fn send(&self, destination: &Destination, message: PushMessage) -> Result<(), NotifyError>;
}

/// Isolated failure for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFailure {
    /// User whose unit of work failed.
    pub user_id: UserId,
    /// Rendered error.
    pub error: String,
}

impl UserFailure {
    fn new(user_id: UserId, error: &NotifyError) -> Self {
        Self {
            user_id,
            error: error.to_string(),
        }
    }
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Users pushed immediately.
    pub delivered: Vec<UserId>,
    /// Users given a pending entry.
    pub queued: Vec<UserId>,
    /// Users whose evaluation, push, or enqueue failed.
    pub failed: Vec<UserFailure>,
}

/// Result of evaluating every user at one instant.
#[derive(Debug, Clone, Default)]
pub struct ActiveScan {
    /// Number of users examined.
    pub scanned: usize,
    /// Users active at the instant.
    pub active: Vec<User>,
    /// Users whose schedule could not be evaluated.
    pub failed: Vec<UserFailure>,
}

enum Placement {
    Delivered,
    Queued,
}

/// Fans events out to users and flushes their pending queues.
pub struct EventDispatcher<Q, C: ?Sized> {
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    queue: Arc<Mutex<Q>>,
    channel: Arc<C>,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl<Q, C: ?Sized> Clone for EventDispatcher<Q, C> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            events: Arc::clone(&self.events),
            queue: Arc::clone(&self.queue),
            channel: Arc::clone(&self.channel),
            clock: Arc::clone(&self.clock),
            audit: self.audit.clone(),
        }
    }
}

impl<Q, C> EventDispatcher<Q, C>
where
    Q: PendingQueue,
    C: PushChannel + ?Sized,
{
    /// Create a dispatcher from its collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        queue: Q,
        channel: Arc<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            events,
            queue: Arc::new(Mutex::new(queue)),
            channel,
            clock,
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// User store.
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Event store.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    /// Push channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    /// Current local time from the dispatcher's clock.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Persist a new event stamped with the current time, then dispatch it.
    ///
    /// Dispatch problems are logged and never undo the stored event.
    ///
    /// # Errors
    ///
    /// Only failures to persist the event.
    pub async fn create_event(&self, message: String) -> Result<Event, NotifyError> {
        let event = self.events.insert(message, self.clock.now())?;
        tracing::info!("event {} created", event.id);

        match self.dispatch(&event).await {
            Ok(report) => tracing::info!(
                event_id = event.id,
                delivered = report.delivered.len(),
                queued = report.queued.len(),
                failed = report.failed.len(),
                "event dispatched"
            ),
            Err(e) => tracing::error!("dispatch of event {} failed: {}", event.id, e),
        }
        Ok(event)
    }

    /// Deliver an event to every active user and queue it for every inactive one.
    ///
    /// Users are placed concurrently and independently; a failure for one is recorded
    /// in the report and the rest still proceed. A push that never returns holds up
    /// the report, not the other users' deliveries or queue entries. Report lists keep
    /// the user store's order.
    ///
    /// # Errors
    ///
    /// Only when the user store cannot be listed.
    pub async fn dispatch(&self, event: &Event) -> Result<DispatchReport, NotifyError> {
        let users = self.users.list_all()?;
        let now = self.clock.now();
        let mut report = DispatchReport::default();

        let placements = join_all(users.iter().map(|user| self.place(user, event, now))).await;
        for (user, placement) in users.iter().zip(placements) {
            match placement {
                Ok(Placement::Delivered) => report.delivered.push(user.id),
                Ok(Placement::Queued) => report.queued.push(user.id),
                Err(e) => {
                    tracing::error!("dispatch of event {} to user {} failed: {}", event.id, user.id, e);
                    self.record_audit(user, event.id, AuditAction::Failed, Some(e.to_string()));
                    report.failed.push(UserFailure::new(user.id, &e));
                }
            }
        }
        Ok(report)
    }

    async fn place(
        &self,
        user: &User,
        event: &Event,
        now: NaiveDateTime,
    ) -> Result<Placement, NotifyError> {
        if is_user_active(user, now)? {
            self.deliver(user, event).await?;
            return Ok(Placement::Delivered);
        }

        self.queue
            .lock()
            .insert(PendingDelivery::new(user.id, event.id, now))?;
        tracing::debug!("event {} queued for user {}", event.id, user.id);
        self.record_audit(user, event.id, AuditAction::Queued, None);
        Ok(Placement::Queued)
    }

    /// Evaluate every user at `now`.
    ///
    /// # Errors
    ///
    /// Only when the user store cannot be listed; corrupt schedules land in
    /// [`ActiveScan::failed`].
    pub fn scan_active(&self, now: NaiveDateTime) -> Result<ActiveScan, NotifyError> {
        let users = self.users.list_all()?;
        let mut scan = ActiveScan {
            scanned: users.len(),
            ..ActiveScan::default()
        };
        for user in users {
            match is_user_active(&user, now) {
                Ok(true) => scan.active.push(user),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("cannot evaluate schedule of user {}: {}", user.id, e);
                    scan.failed.push(UserFailure::new(user.id, &e));
                }
            }
        }
        Ok(scan)
    }

    /// Users active right now.
    ///
    /// # Errors
    ///
    /// Only when the user store cannot be listed.
    pub fn active_users(&self) -> Result<Vec<User>, NotifyError> {
        Ok(self.scan_active(self.clock.now())?.active)
    }

    /// Deliver and remove every pending entry of a user.
    ///
    /// Entries are handled one at a time; the first failure stops the flush and
    /// leaves that entry and the rest queued for the next attempt. Returns the
    /// number of entries delivered.
    ///
    /// # Errors
    ///
    /// [`NotifyError::NotFound`] when a queued event has been deleted, transport
    /// or queue failures otherwise.
    pub async fn flush(&self, user: &User) -> Result<usize, NotifyError> {
        let entries = self.queue.lock().find_by_user(user.id)?;
        if entries.is_empty() {
            return Ok(0);
        }
        tracing::debug!("flushing {} pending entries for user {}", entries.len(), user.id);

        let mut delivered = 0;
        for entry in entries {
            if let Err(e) = self.flush_entry(user, &entry).await {
                self.record_audit(user, entry.key.event_id, AuditAction::Failed, Some(e.to_string()));
                return Err(e);
            }
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Look a user up and [`flush`](Self::flush) them.
    ///
    /// # Errors
    ///
    /// [`NotifyError::NotFound`] for an unknown user, otherwise as `flush`.
    pub async fn flush_user(&self, user_id: UserId) -> Result<usize, NotifyError> {
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or_else(|| NotifyError::user_not_found(user_id))?;
        self.flush(&user).await
    }

    async fn flush_entry(&self, user: &User, entry: &PendingDelivery) -> Result<(), NotifyError> {
        let event = self
            .events
            .find_by_id(entry.key.event_id)?
            .ok_or_else(|| NotifyError::event_not_found(entry.key.event_id))?;
        self.deliver(user, &event).await?;
        if !self.queue.lock().delete(&entry.key)? {
            tracing::debug!("pending entry {} already removed", entry.key);
        }
        Ok(())
    }

    async fn deliver(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        let destination = Destination::user(user.id);
        self.channel
            .send(&destination, PushMessage::for_event(event))
            .await?;

        let now = self.clock.now();
        tracing::info!(
            user_id = user.id,
            event_id = event.id,
            destination = %destination,
            "{} user {} notified: {}",
            now.format("%d.%m.%Y %H:%M:%S"),
            user.full_name,
            event.message
        );
        self.record_audit(user, event.id, AuditAction::Delivered, Some(event.message.clone()));
        Ok(())
    }

    /// Pending entries for a user.
    ///
    /// # Errors
    ///
    /// Queue backend failures.
    pub fn pending_for(&self, user_id: UserId) -> Result<Vec<PendingDelivery>, NotifyError> {
        self.queue.lock().find_by_user(user_id)
    }

    /// Total number of pending entries.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    fn record_audit(&self, user: &User, event_id: EventId, action: AuditAction, detail: Option<String>) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(
                user.id,
                user.full_name.clone(),
                event_id,
                action,
                self.clock.now(),
                detail,
            ));
        }
    }
}
