//! Builders to construct the dispatcher and sweeper from configuration.
//!
//! Backends are produced by factory closures so callers can keep a typed handle to a
//! channel they need afterwards, such as a [`SessionPushChannel`](crate::infra::SessionPushChannel)
//! that clients subscribe to.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{PushBackendConfig, QueueBackendConfig, ServiceConfig};
use crate::core::{
    AppResult, AuditSink, EventDispatcher, EventStore, InMemoryAuditSink, JsonLinesAuditSink,
    NotifyError, PendingQueue, PushChannel, UserStore,
};
use crate::infra::{FilePendingQueue, FilePushChannel, InMemoryPendingQueue, InMemoryPushChannel};
use crate::util::Clock;

/// Dispatcher over type-erased backends, as produced from configuration.
pub type ConfiguredDispatcher = EventDispatcher<Box<dyn PendingQueue>, dyn PushChannel>;

const QUEUE_STREAM: &str = "pending";
const PUSH_STREAM: &str = "push";
const AUDIT_STREAM: &str = "deliveries";

fn data_dir(cfg: &ServiceConfig) -> Result<&Path, NotifyError> {
    cfg.data_dir
        .as_deref()
        .ok_or_else(|| NotifyError::Backend("data_dir is required for file backends".into()))
}

/// Queue backend named by the configuration.
///
/// # Errors
///
/// [`NotifyError::Backend`] when the file queue cannot be opened.
pub fn default_queue_factory(cfg: &ServiceConfig) -> Result<Box<dyn PendingQueue>, NotifyError> {
    let queue: Box<dyn PendingQueue> = match cfg.queue {
        QueueBackendConfig::InMemory => Box::new(InMemoryPendingQueue::new(cfg.max_queue_depth)),
        QueueBackendConfig::File => Box::new(FilePendingQueue::open(
            data_dir(cfg)?,
            QUEUE_STREAM,
            cfg.max_queue_depth,
        )?),
    };
    Ok(queue)
}

/// Push backend named by the configuration.
///
/// # Errors
///
/// [`NotifyError::Backend`] when the file outbox cannot be opened, or a session
/// channel is requested without the `tokio-runtime` feature.
pub fn default_channel_factory(cfg: &ServiceConfig) -> Result<Arc<dyn PushChannel>, NotifyError> {
    let channel: Arc<dyn PushChannel> = match cfg.push {
        PushBackendConfig::InMemory => Arc::new(InMemoryPushChannel::new()),
        PushBackendConfig::File => Arc::new(FilePushChannel::open(data_dir(cfg)?, PUSH_STREAM)?),
        #[cfg(feature = "tokio-runtime")]
        PushBackendConfig::Session => Arc::new(crate::infra::SessionPushChannel::new()),
        #[cfg(not(feature = "tokio-runtime"))]
        PushBackendConfig::Session => {
            return Err(NotifyError::Backend(
                "session push requires the tokio-runtime feature".into(),
            ))
        }
    };
    Ok(channel)
}

fn audit_sink(cfg: &ServiceConfig) -> Result<Option<Box<dyn AuditSink>>, NotifyError> {
    if cfg.audit_capacity == 0 {
        return Ok(None);
    }
    let sink: Box<dyn AuditSink> = match &cfg.data_dir {
        Some(dir) => Box::new(JsonLinesAuditSink::new(dir, AUDIT_STREAM)?),
        None => Box::new(InMemoryAuditSink::new(cfg.audit_capacity)),
    };
    Ok(Some(sink))
}

/// Build a dispatcher from configuration using provided factories.
///
/// An audit sink is attached unless `audit_capacity` is 0: a JSON-lines file when
/// `data_dir` is set, a bounded in-memory trail otherwise.
///
/// # Errors
///
/// Invalid configuration or a factory failure.
pub fn build_dispatcher<FQ, FC>(
    cfg: &ServiceConfig,
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    queue_factory: FQ,
    channel_factory: FC,
) -> Result<ConfiguredDispatcher, NotifyError>
where
    FQ: FnOnce(&ServiceConfig) -> Result<Box<dyn PendingQueue>, NotifyError>,
    FC: FnOnce(&ServiceConfig) -> Result<Arc<dyn PushChannel>, NotifyError>,
{
    cfg.validate()
        .map_err(|e| NotifyError::Backend(format!("config invalid: {e}")))?;

    let queue = queue_factory(cfg)?;
    let channel = channel_factory(cfg)?;
    let mut dispatcher = EventDispatcher::new(users, events, queue, channel, clock);
    if let Some(sink) = audit_sink(cfg)? {
        dispatcher = dispatcher.with_audit(sink);
    }
    tracing::info!(
        queue = ?cfg.queue,
        push = ?cfg.push,
        "dispatcher built"
    );
    Ok(dispatcher)
}

/// Load configuration from `NOTIFY_*` variables (and `.env`) and build a dispatcher
/// with the default backends.
///
/// # Errors
///
/// Configuration or backend failures, with context for startup logs.
pub fn build_from_env(
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
) -> AppResult<(ServiceConfig, ConfiguredDispatcher)> {
    let _ = dotenvy::dotenv();
    build_from_lookup(|key| std::env::var(key).ok(), users, events, clock)
}

/// Same as [`build_from_env`] over an arbitrary variable source.
///
/// # Errors
///
/// Configuration or backend failures, with context for startup logs.
pub fn build_from_lookup<F>(
    lookup: F,
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
) -> AppResult<(ServiceConfig, ConfiguredDispatcher)>
where
    F: Fn(&str) -> Option<String>,
{
    let cfg = ServiceConfig::from_lookup(lookup)
        .map_err(anyhow::Error::msg)
        .context("failed to load service configuration")?;
    let dispatcher = build_dispatcher(
        &cfg,
        users,
        events,
        clock,
        default_queue_factory,
        default_channel_factory,
    )
    .context("failed to build dispatcher")?;
    Ok((cfg, dispatcher))
}

/// Build a sweeper over a configured dispatcher.
#[cfg(feature = "tokio-runtime")]
#[must_use]
pub fn build_sweeper<S>(
    cfg: &ServiceConfig,
    dispatcher: ConfiguredDispatcher,
    spawner: S,
) -> crate::core::Sweeper<Box<dyn PendingQueue>, dyn PushChannel, S>
where
    S: crate::core::Spawn + Clone + Send + Sync + 'static,
{
    crate::core::Sweeper::new(dispatcher, spawner, cfg.sweep.clone())
}
